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

//! Concrete performance tests and their dispatch by numeric test id.
//!
//! | id | test |
//! |----|------|
//! | 1 | [`OpenSearchIndexTest`] |
//! | 2 | [`OpenSearchQueryTest`] |
//! | 3 | [`FlatIndexTest`] |
//! | 4 | [`FlatQueryTest`] |

pub mod flat;
pub mod opensearch;

pub use flat::{FlatIndexTest, FlatQueryTest};
pub use opensearch::{bulk_transform, query_body, OpenSearchIndexTest, OpenSearchQueryTest};

use crate::adapters::{FlatIndex, OpenSearchClient};
use crate::core::config::{ServiceConfig, ToolConfig};
use crate::error::{PerfError, Result};
use crate::harness::lifecycle::PerfTest;
use std::fmt;

/// Test variant selected by `test_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    /// Index creation, bulk ingest and refresh against OpenSearch.
    OpenSearchIndex = 1,
    /// k-NN queries against a prepared OpenSearch index.
    OpenSearchQuery = 2,
    /// Index initialisation, ingest and build of the flat index.
    FlatIndex = 3,
    /// k-NN queries against a built flat index.
    FlatQuery = 4,
}

impl TestKind {
    /// Every test variant in id order.
    pub const ALL: [TestKind; 4] = [
        TestKind::OpenSearchIndex,
        TestKind::OpenSearchQuery,
        TestKind::FlatIndex,
        TestKind::FlatQuery,
    ];

    /// Looks up the variant for a configured `test_id`.
    pub fn from_id(id: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == id)
            .ok_or_else(|| {
                PerfError::configuration(format!(
                    "Unknown test_id `{}`. Supported test ids: 1, 2, 3, 4",
                    id
                ))
            })
    }

    /// Numeric identifier of the variant.
    pub fn id(&self) -> u32 {
        *self as u32
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            TestKind::OpenSearchIndex => "opensearch_index",
            TestKind::OpenSearchQuery => "opensearch_query",
            TestKind::FlatIndex => "flat_index",
            TestKind::FlatQuery => "flat_query",
        }
    }

    /// `knn_service` the variant runs against.
    pub fn service(&self) -> &'static str {
        match self {
            TestKind::OpenSearchIndex | TestKind::OpenSearchQuery => "opensearch",
            TestKind::FlatIndex | TestKind::FlatQuery => "flat",
        }
    }

    /// Fails unless `service` is the one this variant runs against.
    pub fn check_service(&self, service: &ServiceConfig) -> Result<()> {
        if service.name() == self.service() {
            return Ok(());
        }
        Err(self.service_mismatch(service))
    }

    fn service_mismatch(&self, service: &ServiceConfig) -> PerfError {
        PerfError::configuration(format!(
            "test_id {} ({}) requires knn_service `{}`, got `{}`",
            self.id(),
            self.name(),
            self.service(),
            service.name()
        ))
    }

    /// Constructs a fresh test instance for one run.
    pub fn build<'a>(&self, config: &'a ToolConfig) -> Result<Box<dyn PerfTest + 'a>> {
        let measures = &config.test_parameters.measures;
        let dataset = &config.dataset;

        let test: Box<dyn PerfTest + 'a> = match (self, &config.service) {
            (TestKind::OpenSearchIndex, ServiceConfig::OpenSearch(service)) => {
                Box::new(OpenSearchIndexTest::new(
                    OpenSearchClient::from_config(service),
                    service,
                    dataset,
                    measures,
                ))
            }
            (TestKind::OpenSearchQuery, ServiceConfig::OpenSearch(service)) => {
                Box::new(OpenSearchQueryTest::new(
                    OpenSearchClient::from_config(service),
                    service,
                    dataset,
                    measures,
                ))
            }
            (TestKind::FlatIndex, ServiceConfig::Flat(service)) => Box::new(FlatIndexTest::new(
                FlatIndex::new(),
                service,
                dataset,
                measures,
            )),
            (TestKind::FlatQuery, ServiceConfig::Flat(service)) => Box::new(FlatQueryTest::new(
                FlatIndex::new(),
                service,
                dataset,
                measures,
            )),
            (_, other) => return Err(self.service_mismatch(other)),
        };
        Ok(test)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
