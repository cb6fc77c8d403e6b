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

//! Index and query tests against an embedded vector index.

use crate::adapters::VectorIndex;
use crate::core::config::FlatConfig;
use crate::core::dataset::Dataset;
use crate::core::measure::Measure;
use crate::error::Result;
use crate::harness::lifecycle::PerfTest;
use crate::harness::step::{Step, StepResult};
use serde_json::{json, Value};

/// Initialises the index, adds the train vectors and builds it.
pub struct FlatIndexTest<'a, I> {
    index: I,
    config: &'a FlatConfig,
    dataset: &'a Dataset,
    measures: &'a [Measure],
}

impl<'a, I: VectorIndex> FlatIndexTest<'a, I> {
    /// Creates the test around an index handle.
    pub fn new(
        index: I,
        config: &'a FlatConfig,
        dataset: &'a Dataset,
        measures: &'a [Measure],
    ) -> Self {
        Self {
            index,
            config,
            dataset,
            measures,
        }
    }
}

impl<I: VectorIndex> PerfTest for FlatIndexTest<'_, I> {
    fn name(&self) -> &str {
        "flat_index"
    }

    fn run_steps(&mut self) -> Result<Vec<StepResult>> {
        let space = self.config.space_type;
        let dimension = self.dataset.dimension();
        let train = &self.dataset.train;
        let index = &mut self.index;

        Ok(vec![
            Step::new("init_index", self.measures)?
                .execute(|| index.init(space, dimension).map(|()| Value::Null))?,
            Step::new("bulk_add", self.measures)?
                .execute(|| index.add_batch(train).map(|_| Value::Null))?,
            Step::new("create_index", self.measures)?
                .execute(|| index.build().map(|()| Value::Null))?,
        ])
    }

    fn cleanup(&mut self) -> Result<()> {
        self.index.clear();
        Ok(())
    }
}

/// Queries every test vector against a built index.
pub struct FlatQueryTest<'a, I> {
    index: I,
    config: &'a FlatConfig,
    dataset: &'a Dataset,
    measures: &'a [Measure],
}

impl<'a, I: VectorIndex> FlatQueryTest<'a, I> {
    /// Creates the test around an index handle.
    pub fn new(
        index: I,
        config: &'a FlatConfig,
        dataset: &'a Dataset,
        measures: &'a [Measure],
    ) -> Self {
        Self {
            index,
            config,
            dataset,
            measures,
        }
    }
}

impl<I: VectorIndex> PerfTest for FlatQueryTest<'_, I> {
    fn name(&self) -> &str {
        "flat_query"
    }

    fn setup(&mut self) -> Result<()> {
        self.index
            .init(self.config.space_type, self.dataset.dimension())?;
        self.index.add_batch(&self.dataset.train)?;
        self.index.build()
    }

    fn run_steps(&mut self) -> Result<Vec<StepResult>> {
        let step = Step::new("query_index", self.measures)?;
        let k = self.config.k;
        let index = &self.index;

        self.dataset
            .test
            .iter()
            .map(|vector| {
                step.execute(|| {
                    let neighbors = index.query(vector, k)?;
                    let (ids, distances): (Vec<usize>, Vec<f32>) =
                        neighbors.iter().map(|n| (n.id, n.distance)).unzip();
                    Ok(json!({ "ids": ids, "distances": distances }))
                })
            })
            .collect()
    }

    fn cleanup(&mut self) -> Result<()> {
        self.index.clear();
        Ok(())
    }
}
