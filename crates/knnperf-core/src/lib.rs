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

//! KNNPerf Core
//!
//! Step execution, aggregation and result diffing for k-NN performance
//! tests.
//!
//! ## Features
//!
//! - **Profiled steps**: wrap any service call with `took` and `memory`
//!   measures and a label
//! - **Aggregation**: per-step totals and p50/p90/p99, whole-test totals
//! - **Runner**: repeated runs averaged into one tool result with host
//!   metadata
//! - **Diff**: validated element-wise difference of two result documents
//!
//! ## Usage
//!
//! ```no_run
//! use knnperf_core::{TestRunner, ToolConfig};
//! use std::path::Path;
//!
//! let config = ToolConfig::from_path(Path::new("tool.yml"))?;
//! let result = TestRunner::new(&config)?.execute()?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapters;
pub mod core;
pub mod diff;
pub mod error;
pub mod harness;
pub mod suites;

pub use crate::core::{Dataset, Measure, Timer, ToolConfig};
pub use diff::{diff, DiffResult};
pub use error::{DiffError, PerfError, Result, ResultSide};
pub use harness::{AggregateResult, PerfTest, Step, StepResult, TestRunner, ToolResult};
pub use suites::TestKind;
