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

//! CLI command implementations

mod diff;
mod run;

pub use diff::diff;
pub use run::run_test;

use crate::error::CliError;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{self, Write};

/// Read a file from disk.
pub fn read_file(path: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| CliError::io_error(path, e))
}

/// Read and parse a JSON document.
pub fn read_json(path: &str) -> Result<Value, CliError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|e| CliError::json_format(path, e))
}

/// Serialize `value` as pretty JSON, or on one line when `compact` is set.
pub fn render_json<T: Serialize>(value: &T, compact: bool) -> Result<String, CliError> {
    let mut json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    json.push('\n');
    Ok(json)
}

/// Write content to a file or stdout.
///
/// # Examples
///
/// ```no_run
/// use knnperf_cli::commands::write_output;
///
/// # fn main() -> Result<(), knnperf_cli::error::CliError> {
/// // Write to stdout
/// write_output("{}\n", None)?;
///
/// // Write to file
/// write_output("{}\n", Some("result.json"))?;
/// # Ok(())
/// # }
/// ```
pub fn write_output(content: &str, path: Option<&str>) -> Result<(), CliError> {
    match path {
        Some(p) => fs::write(p, content).map_err(|e| CliError::io_error(p, e)),
        None => io::stdout()
            .write_all(content.as_bytes())
            .map_err(|e| CliError::io_error("<stdout>", e)),
    }
}
