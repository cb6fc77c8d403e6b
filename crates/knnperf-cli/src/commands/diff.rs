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

//! Diff command - compare two result documents

use super::{read_json, render_json, write_output};
use crate::error::CliError;
use tracing::info;

/// Diff two result documents and write `changed - base`.
///
/// Writes to `output` when given, otherwise to stdout.
///
/// # Errors
///
/// Returns `Err` if either file cannot be read or parsed, if the documents
/// fail validation, or if the diff cannot be written.
pub fn diff(
    base: &str,
    changed: &str,
    metadata: bool,
    output: Option<&str>,
    compact: bool,
) -> Result<(), CliError> {
    let base_result = read_json(base)?;
    let changed_result = read_json(changed)?;

    let result = knnperf_core::diff(&base_result, &changed_result, metadata)?;
    info!(base, changed, keys = result.values().len(), "computed diff");

    write_output(&render_json(&result, compact)?, output)
}
