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

//! Test command - run a configured performance test

use super::{render_json, write_output};
use crate::error::CliError;
use colored::Colorize;
use knnperf_core::{TestRunner, ToolConfig};
use std::path::Path;
use tracing::info;

/// Run the test described by `config` and write the tool result to `output`.
///
/// # Errors
///
/// Returns `Err` if:
/// - The configuration, service configuration or dataset cannot be loaded
/// - The configuration selects an unknown or mismatched test
/// - Any run fails
/// - The result cannot be written
pub fn run_test(config: &str, output: &str, compact: bool) -> Result<(), CliError> {
    let tool_config = ToolConfig::from_path(Path::new(config))?;
    let runner = TestRunner::new(&tool_config)?;
    info!(
        test = %runner.kind(),
        name = %tool_config.test_name,
        runs = tool_config.test_parameters.num_runs,
        "running test"
    );

    let result = runner.execute()?;
    write_output(&render_json(&result, compact)?, Some(output))?;
    info!(output, keys = result.aggregate.len(), "wrote tool result");

    eprintln!(
        "{} {} ({} run(s)) -> {}",
        "✓".green().bold(),
        tool_config.test_name,
        tool_config.test_parameters.num_runs,
        output
    );
    Ok(())
}
