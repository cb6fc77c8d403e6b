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

//! Core infrastructure.
//!
//! # Modules
//!
//! - `timer`: Wall-clock stopwatch
//! - `measure`: Measurement strategies (`took`, `memory`)
//! - `config`: Tool and service configuration
//! - `dataset`: Train/test vector sets

pub mod config;
pub mod dataset;
pub mod measure;
pub mod timer;

pub use config::{
    FlatConfig, OpenSearchConfig, ServiceConfig, TestParameters, ToolConfig, DEFAULT_BULK_SIZE,
    DEFAULT_ENDPOINT, DEFAULT_K,
};
pub use dataset::Dataset;
pub use measure::{resident_memory, Action, Measure};
pub use timer::Timer;
