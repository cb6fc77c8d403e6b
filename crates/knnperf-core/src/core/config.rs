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

//! Tool and service configuration.
//!
//! A test is described by a YAML tool configuration that points at a
//! service configuration and a dataset:
//!
//! ```yaml
//! test_name: flat-index
//! test_id: 3
//! knn_service: flat
//! service_config: flat.yml
//! dataset: vectors.json
//! dataset_format: json
//! test_parameters:
//!   num_runs: 3
//!   show_runs: false
//!   measures: [took, memory]
//! ```
//!
//! Relative paths are resolved against the directory of the file that
//! contains them. Loading produces one [`ToolConfig`] that is built once and
//! passed by reference to the test runner.

use crate::adapters::flat::SpaceType;
use crate::core::dataset::Dataset;
use crate::core::measure::Measure;
use crate::error::{PerfError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default OpenSearch endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9200";

/// Default number of vectors per bulk request.
pub const DEFAULT_BULK_SIZE: usize = 5_000;

/// Default number of neighbours requested per query.
pub const DEFAULT_K: usize = 10;

/// Parameters controlling how often a test runs and what it records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestParameters {
    /// Number of independent runs to average.
    #[serde(default = "default_num_runs")]
    pub num_runs: u32,
    /// Include every per-run aggregate in the tool result.
    #[serde(default)]
    pub show_runs: bool,
    /// Measures attached to every step and tracked by the aggregator.
    #[serde(default = "default_measures")]
    pub measures: Vec<Measure>,
}

fn default_num_runs() -> u32 {
    1
}

fn default_measures() -> Vec<Measure> {
    vec![Measure::Took]
}

impl Default for TestParameters {
    fn default() -> Self {
        Self {
            num_runs: default_num_runs(),
            show_runs: false,
            measures: default_measures(),
        }
    }
}

impl TestParameters {
    /// Sets the run count.
    pub fn with_num_runs(mut self, num_runs: u32) -> Self {
        self.num_runs = num_runs;
        self
    }

    /// Sets whether per-run aggregates are kept.
    pub fn with_show_runs(mut self, show_runs: bool) -> Self {
        self.show_runs = show_runs;
        self
    }

    /// Sets the tracked measures.
    pub fn with_measures(mut self, measures: &[Measure]) -> Self {
        self.measures = measures.to_vec();
        self
    }

    /// Checks the run parameters.
    pub fn validate(&self) -> Result<()> {
        if self.num_runs == 0 {
            return Err(PerfError::configuration("num_runs must be at least 1"));
        }
        if self.measures.is_empty() {
            return Err(PerfError::configuration("measures must not be empty"));
        }
        Ok(())
    }
}

/// Settings for a remote OpenSearch cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenSearchConfig {
    /// Base URL of the cluster.
    pub endpoint: String,
    /// Index created and dropped by the tests.
    pub index_name: String,
    /// Settings/mappings body sent when creating the index.
    pub index_spec: Value,
    /// Vectors per bulk request.
    pub bulk_size: usize,
    /// Value of `knn.algo_param.index_thread_qty`.
    pub index_thread_qty: u32,
    /// Neighbours requested per query.
    pub k: usize,
    /// Vector field name in the index mapping.
    pub field_name: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            index_name: "test_index".to_string(),
            index_spec: Value::Object(Default::default()),
            bulk_size: DEFAULT_BULK_SIZE,
            index_thread_qty: 1,
            k: DEFAULT_K,
            field_name: "test_vector".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Settings for the in-process flat index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlatConfig {
    /// Distance space.
    #[serde(default)]
    pub space_type: SpaceType,
    /// Neighbours requested per query.
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    DEFAULT_K
}

impl Default for FlatConfig {
    fn default() -> Self {
        Self {
            space_type: SpaceType::default(),
            k: DEFAULT_K,
        }
    }
}

/// Configuration of the service under test.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceConfig {
    /// A remote OpenSearch cluster.
    OpenSearch(OpenSearchConfig),
    /// The in-process flat index.
    Flat(FlatConfig),
}

impl ServiceConfig {
    /// Returns the `knn_service` name of this configuration.
    pub fn name(&self) -> &'static str {
        match self {
            ServiceConfig::OpenSearch(_) => "opensearch",
            ServiceConfig::Flat(_) => "flat",
        }
    }
}

/// Fully loaded configuration of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// Human readable name echoed into the result.
    pub test_name: String,
    /// Numeric identifier selecting the test variant.
    pub test_id: u32,
    /// Service under test.
    pub service: ServiceConfig,
    /// Vectors used by the test.
    pub dataset: Dataset,
    /// Run parameters.
    pub test_parameters: TestParameters,
}

impl ToolConfig {
    /// Creates a configuration with default run parameters.
    pub fn new(
        test_name: impl Into<String>,
        test_id: u32,
        service: ServiceConfig,
        dataset: Dataset,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            test_id,
            service,
            dataset,
            test_parameters: TestParameters::default(),
        }
    }

    /// Sets the run parameters.
    pub fn with_parameters(mut self, test_parameters: TestParameters) -> Self {
        self.test_parameters = test_parameters;
        self
    }

    /// Loads a tool configuration file together with the service
    /// configuration and dataset it references.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a referenced file cannot be read, and a
    /// configuration error for anything that fails validation.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = read_file(path)?;
        Self::from_yaml_str(&content, base_dir(path))
    }

    /// Parses a tool configuration, resolving relative paths against
    /// `dir`.
    pub fn from_yaml_str(content: &str, dir: &Path) -> Result<Self> {
        let raw: RawToolConfig = parse_yaml(content, "tool config")?;
        raw.test_parameters.validate()?;

        let service_path = dir.join(&raw.service_config);
        let service_content = read_file(&service_path)?;
        let service = match raw.knn_service.as_str() {
            "opensearch" => {
                let raw_service: RawOpenSearchConfig =
                    parse_yaml(&service_content, "opensearch config")?;
                ServiceConfig::OpenSearch(raw_service.resolve(base_dir(&service_path))?)
            }
            "flat" => {
                let flat: FlatConfig = parse_yaml(&service_content, "flat config")?;
                if flat.k == 0 {
                    return Err(PerfError::configuration("k must be at least 1"));
                }
                ServiceConfig::Flat(flat)
            }
            other => {
                return Err(PerfError::configuration(format!(
                    "Unknown knn_service `{}`. Supported services: opensearch, flat",
                    other
                )))
            }
        };

        let dataset = Dataset::load(&dir.join(&raw.dataset), &raw.dataset_format)?;

        Ok(Self {
            test_name: raw.test_name,
            test_id: raw.test_id,
            service,
            dataset,
            test_parameters: raw.test_parameters,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawToolConfig {
    test_name: String,
    test_id: u32,
    knn_service: String,
    service_config: PathBuf,
    dataset: PathBuf,
    #[serde(default = "default_dataset_format")]
    dataset_format: String,
    #[serde(default)]
    test_parameters: TestParameters,
}

fn default_dataset_format() -> String {
    "json".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOpenSearchConfig {
    endpoint: Option<String>,
    index_name: Option<String>,
    index_spec: Option<PathBuf>,
    bulk_size: Option<usize>,
    index_thread_qty: Option<u32>,
    k: Option<usize>,
    field_name: Option<String>,
    timeout_secs: Option<u64>,
}

impl RawOpenSearchConfig {
    fn resolve(self, dir: &Path) -> Result<OpenSearchConfig> {
        let defaults = OpenSearchConfig::default();

        let index_spec = match self.index_spec {
            Some(spec_path) => {
                let spec_path = dir.join(spec_path);
                let content = read_file(&spec_path)?;
                serde_json::from_str(&content).map_err(|e| {
                    PerfError::configuration(format!(
                        "Invalid index_spec '{}': {}",
                        spec_path.display(),
                        e
                    ))
                })?
            }
            None => defaults.index_spec,
        };

        let config = OpenSearchConfig {
            endpoint: self.endpoint.unwrap_or(defaults.endpoint),
            index_name: self.index_name.unwrap_or(defaults.index_name),
            index_spec,
            bulk_size: self.bulk_size.unwrap_or(defaults.bulk_size),
            index_thread_qty: self.index_thread_qty.unwrap_or(defaults.index_thread_qty),
            k: self.k.unwrap_or(defaults.k),
            field_name: self.field_name.unwrap_or(defaults.field_name),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
        };

        if config.bulk_size == 0 {
            return Err(PerfError::configuration("bulk_size must be at least 1"));
        }
        if config.k == 0 {
            return Err(PerfError::configuration("k must be at least 1"));
        }
        Ok(config)
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| PerfError::io_error(path, e))
}

fn parse_yaml<T: serde::de::DeserializeOwned>(content: &str, what: &str) -> Result<T> {
    serde_yaml::from_str(content)
        .map_err(|e| PerfError::configuration(format!("Invalid {}: {}", what, e)))
}

fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}
