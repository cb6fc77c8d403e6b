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

//! KNNPerf CLI library for command-line parsing and execution.
//!
//! # Commands
//!
//! - **test**: Run a configured k-NN performance test and write the result
//! - **diff**: Validate and diff two result documents
//!
//! # Examples
//!
//! ```no_run
//! use knnperf_cli::commands::{diff, run_test};
//!
//! # fn main() -> Result<(), knnperf_cli::error::CliError> {
//! run_test("tool.yml", "result.json", false)?;
//! diff("base.json", "changed.json", false, None, false)?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod error;

pub use error::CliError;
