// Dweve KNNPerf - k-NN Performance Tool
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Service adapters.
//!
//! The tests talk to a service only through the traits defined here, so a
//! test can be driven against a live cluster, the in-process flat index, or
//! a fake in unit tests.
//!
//! - [`SearchEngine`]: a search cluster reached over HTTP
//! - [`VectorIndex`]: an embedded nearest-neighbour index

pub mod flat;
pub mod opensearch;

pub use flat::{FlatIndex, Neighbor, SpaceType};
pub use opensearch::OpenSearchClient;

use crate::error::Result;
use serde_json::Value;

/// Operations a search engine exposes to the benchmark.
///
/// Every call returns the engine's JSON response. A native `took` field in
/// that response is kept by the `took` measure.
pub trait SearchEngine {
    /// Applies transient cluster settings.
    fn put_cluster_settings(&mut self, settings: &Value) -> Result<Value>;

    /// Creates `index` with the given settings/mappings body.
    fn create_index(&mut self, index: &str, body: &Value) -> Result<Value>;

    /// Sends one newline-delimited bulk request.
    fn bulk(&mut self, ndjson: &str) -> Result<Value>;

    /// Makes recent writes to `index` searchable.
    fn refresh(&mut self, index: &str) -> Result<Value>;

    /// Runs a search request against `index`.
    fn search(&mut self, index: &str, body: &Value) -> Result<Value>;

    /// Drops `index`.
    fn delete_index(&mut self, index: &str) -> Result<Value>;
}

/// An embedded k-NN index handle.
///
/// The lifecycle is `init`, any number of `add_batch` calls, `build`, then
/// `query`. Handles are not shared between tests.
pub trait VectorIndex {
    /// Resets the handle to an empty index in `space` over `dimension`-sized
    /// vectors.
    fn init(&mut self, space: SpaceType, dimension: usize) -> Result<()>;

    /// Adds vectors, assigning ids in insertion order. Returns the number of
    /// vectors now held.
    fn add_batch(&mut self, vectors: &[Vec<f32>]) -> Result<usize>;

    /// Prepares the added vectors for querying.
    fn build(&mut self) -> Result<()>;

    /// Returns up to `k` neighbours of `vector`, closest first.
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Releases every vector held by the handle.
    fn clear(&mut self);
}
