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

//! Structured error types for the KNNPerf CLI.
//!
//! All commands return `Result<T, CliError>` so `main` can report every
//! failure the same way.

use knnperf_core::{DiffError, PerfError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for CLI operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CliError {
    /// Reading an input or writing an output file failed.
    #[error("I/O error for '{path}': {message}")]
    Io {
        /// The file path that caused the error
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// An input document is not valid JSON, or a result could not be
    /// serialized.
    #[error("JSON format error: {message}")]
    JsonFormat {
        /// The error message
        message: String,
    },

    /// Loading the configuration or running the test failed.
    #[error(transparent)]
    Perf(#[from] PerfError),

    /// The result documents passed to `diff` failed validation.
    #[error(transparent)]
    Diff(#[from] DiffError),
}

impl CliError {
    /// Create an I/O error with file path context.
    pub fn io_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Create a JSON error naming the document it came from.
    pub fn json_format(path: &str, source: serde_json::Error) -> Self {
        Self::JsonFormat {
            message: format!("'{}': {}", path, source),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonFormat {
            message: err.to_string(),
        }
    }
}
