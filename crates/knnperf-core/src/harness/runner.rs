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

//! Repeated test execution and cross-run averaging.

use crate::core::config::{TestParameters, ToolConfig};
use crate::error::Result;
use crate::harness::aggregator::AggregateResult;
use crate::harness::lifecycle::{PerfTest, TestExecution};
use crate::harness::metadata::RunMetadata;
use crate::suites::TestKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Final artifact of a runner invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Test and host description.
    #[serde(flatten)]
    pub metadata: RunMetadata,
    /// Every aggregate key averaged across runs.
    pub aggregate: AggregateResult,
    /// Echo of the run parameters.
    pub test_parameters: TestParameters,
    /// Per-run aggregates in execution order, when `show_runs` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<Vec<AggregateResult>>,
}

/// Averages run aggregates key-wise over the configured run count.
///
/// Keys missing from any run are skipped rather than averaged over fewer
/// runs.
pub fn aggregate_runs(runs: &[AggregateResult], num_runs: u32) -> AggregateResult {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for run in runs {
        for (key, value) in run.iter() {
            let entry = sums.entry(key).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let divisor = f64::from(num_runs.max(1));
    sums.into_iter()
        .filter_map(|(key, (sum, seen))| {
            if seen == runs.len() {
                Some((key, sum / divisor))
            } else {
                warn!(key, seen, runs = runs.len(), "skipping key missing from some runs");
                None
            }
        })
        .collect()
}

/// Executes a configured test `num_runs` times and combines the results.
#[derive(Debug)]
pub struct TestRunner<'a> {
    config: &'a ToolConfig,
    kind: TestKind,
}

impl<'a> TestRunner<'a> {
    /// Resolves the test selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid run parameters, an unknown
    /// `test_id`, or a test that does not match the configured service. No
    /// run is attempted in that case.
    pub fn new(config: &'a ToolConfig) -> Result<Self> {
        config.test_parameters.validate()?;
        let kind = TestKind::from_id(config.test_id)?;
        kind.check_service(&config.service)?;
        Ok(Self { config, kind })
    }

    /// Returns the resolved test variant.
    pub fn kind(&self) -> TestKind {
        self.kind
    }

    /// Runs the configured test.
    pub fn execute(&self) -> Result<ToolResult> {
        self.execute_with(|| self.kind.build(self.config))
    }

    /// Runs tests produced by `factory`, one fresh instance per run.
    ///
    /// Runs are strictly sequential. The first failing run aborts the whole
    /// invocation.
    pub fn execute_with<T, F>(&self, mut factory: F) -> Result<ToolResult>
    where
        T: PerfTest,
        F: FnMut() -> Result<T>,
    {
        let params = &self.config.test_parameters;
        let mut runs = Vec::with_capacity(params.num_runs as usize);

        for run in 1..=params.num_runs {
            let test = factory()?;
            info!(test = test.name(), run, of = params.num_runs, "starting run");
            let aggregate = TestExecution::new(test, &params.measures).execute()?;
            info!(run, keys = aggregate.len(), "run finished");
            runs.push(aggregate);
        }

        let aggregate = aggregate_runs(&runs, params.num_runs);
        Ok(ToolResult {
            metadata: RunMetadata::collect(&self.config.test_name, self.config.test_id),
            aggregate,
            test_parameters: params.clone(),
            runs: params.show_runs.then_some(runs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{FlatConfig, ServiceConfig};
    use crate::core::dataset::Dataset;
    use crate::core::measure::Measure;
    use crate::error::PerfError;
    use crate::harness::step::{Step, StepResult};
    use serde_json::json;

    struct Scripted {
        tooks: Vec<u64>,
    }

    impl PerfTest for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn run_steps(&mut self) -> Result<Vec<StepResult>> {
            let step = Step::new("x", &[Measure::Took])?;
            self.tooks
                .iter()
                .map(|took| step.execute(|| Ok(json!({ "took": took }))))
                .collect()
        }
    }

    fn flat_config(test_id: u32, params: TestParameters) -> ToolConfig {
        let dataset = Dataset::new(vec![vec![1.0, 0.0]], vec![vec![0.0, 1.0]]).unwrap();
        ToolConfig::new("unit", test_id, ServiceConfig::Flat(FlatConfig::default()), dataset)
            .with_parameters(params)
    }

    fn run(values: &[(&str, f64)]) -> AggregateResult {
        values.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_aggregate_runs_averages() {
        let runs = vec![run(&[("x_took_total", 100.0)]), run(&[("x_took_total", 300.0)])];
        let aggregate = aggregate_runs(&runs, 2);
        assert_eq!(aggregate.get("x_took_total"), Some(200.0));
    }

    #[test]
    fn test_aggregate_runs_skips_partial_keys() {
        let runs = vec![
            run(&[("a", 1.0), ("b", 5.0)]),
            run(&[("a", 3.0)]),
        ];
        let aggregate = aggregate_runs(&runs, 2);
        assert_eq!(aggregate.get("a"), Some(2.0));
        assert!(!aggregate.contains_key("b"));
    }

    #[test]
    fn test_runner_averages_fresh_instances() {
        let config = flat_config(3, TestParameters::default().with_num_runs(2));
        let runner = TestRunner::new(&config).unwrap();

        let mut scripts = vec![vec![300], vec![100]];
        let result = runner
            .execute_with(|| Ok(Scripted { tooks: scripts.pop().unwrap_or_default() }))
            .unwrap();

        assert_eq!(result.aggregate.get("x_took_total"), Some(200.0));
        assert_eq!(result.aggregate.get("test_took"), Some(200.0));
        assert!(result.runs.is_none());
        assert_eq!(result.metadata.test_name, "unit");
    }

    #[test]
    fn test_runner_keeps_runs_when_requested() {
        let params = TestParameters::default().with_num_runs(3).with_show_runs(true);
        let config = flat_config(3, params);
        let runner = TestRunner::new(&config).unwrap();

        let result = runner
            .execute_with(|| Ok(Scripted { tooks: vec![5, 10] }))
            .unwrap();

        let runs = result.runs.unwrap();
        assert_eq!(runs.len(), 3);
        assert!(runs.iter().all(|r| r.get("x_took_total") == Some(15.0)));
    }

    #[test]
    fn test_unknown_test_id_fails_before_running() {
        let config = flat_config(9, TestParameters::default());
        let err = TestRunner::new(&config).unwrap_err();
        assert!(matches!(err, PerfError::Configuration(_)));
    }

    #[test]
    fn test_service_mismatch_fails() {
        let config = flat_config(1, TestParameters::default());
        let err = TestRunner::new(&config).unwrap_err();
        assert!(err.to_string().contains("requires knn_service `opensearch`"));
    }

    #[test]
    fn test_failing_run_aborts() {
        let config = flat_config(3, TestParameters::default().with_num_runs(3));
        let runner = TestRunner::new(&config).unwrap();

        let mut built = 0;
        let err = runner
            .execute_with(|| {
                built += 1;
                if built == 2 {
                    Err(PerfError::adapter("fake", "unreachable"))
                } else {
                    Ok(Scripted { tooks: vec![1] })
                }
            })
            .unwrap_err();

        assert_eq!(err, PerfError::adapter("fake", "unreachable"));
        assert_eq!(built, 2);
    }

    #[test]
    fn test_tool_result_serialization() {
        let config = flat_config(3, TestParameters::default());
        let runner = TestRunner::new(&config).unwrap();
        let result = runner.execute_with(|| Ok(Scripted { tooks: vec![2] })).unwrap();

        let value = serde_json::to_value(&result).unwrap();
        for key in ["test_name", "test_id", "date", "os_version", "processor", "memory"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["aggregate"]["x_took_total"], json!(2.0));
        assert_eq!(value["test_parameters"]["num_runs"], json!(1));
        assert!(value.get("runs").is_none());
    }
}
