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

//! Error types for k-NN performance testing.
//!
//! Two families of errors live here:
//!
//! - [`PerfError`]: everything that can go wrong while loading a
//!   configuration or executing a test (timer misuse, invalid configuration,
//!   adapter failures, I/O).
//! - [`DiffError`]: validation failures raised while diffing two result
//!   documents.
//!
//! Adapter errors are never retried or swallowed by the engine; they travel
//! unchanged from the failing step up to the caller of the runner.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, PerfError>;

/// Errors raised while configuring or executing performance tests.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerfError {
    /// `Timer::end` was called before `Timer::start`.
    #[error("Timer must call start() before calling end()")]
    TimerNotStarted,

    /// Invalid or unrecognized test identifier, run parameter or service
    /// configuration. Always raised before the first run starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A service adapter call failed.
    #[error("{service} request failed: {message}")]
    Adapter {
        /// Name of the adapter (`opensearch`, `flat`, ...)
        service: String,
        /// Error reported by the adapter
        message: String,
    },

    /// Reading a configuration or dataset file failed.
    #[error("I/O error for '{path}': {message}")]
    Io {
        /// The file path that caused the error
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(String),

    /// YAML deserialization failed.
    #[error("YAML error: {0}")]
    Yaml(String),
}

impl PerfError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an adapter error for the named service.
    pub fn adapter(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Adapter {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with file path context.
    pub fn io_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

impl From<serde_json::Error> for PerfError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json(source.to_string())
    }
}

impl From<serde_yaml::Error> for PerfError {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Yaml(source.to_string())
    }
}

/// Which of the two diff inputs a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSide {
    /// The reference document.
    Base,
    /// The document compared against the reference.
    Changed,
}

impl fmt::Display for ResultSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultSide::Base => write!(f, "base_result"),
            ResultSide::Changed => write!(f, "changed_result"),
        }
    }
}

/// Validation failures raised by [`crate::diff::diff`].
///
/// Validation stops at the first violation, so each error names exactly one
/// key and one side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// A `results` or `metadata` key is missing or is not a mapping.
    #[error("{side} has a missing or invalid key `{key}`")]
    InvalidTestResult {
        /// The missing key
        key: String,
        /// The document lacking it
        side: ResultSide,
    },

    /// The two `results` mappings have different key sets.
    #[error("key `{key}` is not present in {side}")]
    InconsistentTestResults {
        /// The unmatched key
        key: String,
        /// The document the key is missing from
        side: ResultSide,
    },

    /// A `results` value is not an integer or floating point number.
    #[error("key `{key}` in {side} points to a non-numeric value")]
    InvalidTestResultType {
        /// The offending key
        key: String,
        /// The document holding the value
        side: ResultSide,
    },

    /// Subtracting the two values of a key leaves the finite range.
    #[error("difference for key `{key}` is not a finite number")]
    NonFiniteDifference {
        /// The key whose difference overflowed
        key: String,
    },
}
