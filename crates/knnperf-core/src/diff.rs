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

//! Validation and element-wise difference of two result documents.
//!
//! Each input is a JSON document shaped `{"results": {key: number},
//! "metadata": {...}}`. Validation fails fast at the first violation:
//! required keys, then identical key sets, then numeric values.

use crate::error::{DiffError, ResultSide};
use serde::Serialize;
use serde_json::{Map, Number, Value};

const RESULTS_KEY: &str = "results";
const METADATA_KEY: &str = "metadata";

/// Output of [`diff`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DiffResult {
    /// `changed - base` for every result key.
    Flat(Map<String, Value>),
    /// The difference together with both metadata mappings.
    WithMetadata {
        /// Metadata of the base document.
        base_metadata: Map<String, Value>,
        /// Metadata of the changed document.
        changed_metadata: Map<String, Value>,
        /// `changed - base` for every result key.
        diff: Map<String, Value>,
    },
}

impl DiffResult {
    /// Returns the per-key differences.
    pub fn values(&self) -> &Map<String, Value> {
        match self {
            DiffResult::Flat(diff) => diff,
            DiffResult::WithMetadata { diff, .. } => diff,
        }
    }
}

/// Computes `changed.results - base.results` after validating both inputs.
///
/// # Errors
///
/// - [`DiffError::InvalidTestResult`] if `results` (or `metadata` when
///   `include_metadata` is set) is missing or not a mapping
/// - [`DiffError::InconsistentTestResults`] if the key sets differ
/// - [`DiffError::InvalidTestResultType`] if a value is not a number
/// - [`DiffError::NonFiniteDifference`] if a difference overflows `f64`
///
/// # Examples
///
/// ```
/// use knnperf_core::diff::diff;
/// use serde_json::json;
///
/// let base = json!({"results": {"test_took": 100}});
/// let changed = json!({"results": {"test_took": 80}});
/// let result = diff(&base, &changed, false).unwrap();
/// assert_eq!(result.values()["test_took"], json!(-20));
/// ```
pub fn diff(base: &Value, changed: &Value, include_metadata: bool) -> Result<DiffResult, DiffError> {
    let metadata = if include_metadata {
        Some((
            mapping(base, METADATA_KEY, ResultSide::Base)?,
            mapping(changed, METADATA_KEY, ResultSide::Changed)?,
        ))
    } else {
        None
    };
    let base_results = mapping(base, RESULTS_KEY, ResultSide::Base)?;
    let changed_results = mapping(changed, RESULTS_KEY, ResultSide::Changed)?;

    check_keys(base_results, changed_results, ResultSide::Changed)?;
    check_keys(changed_results, base_results, ResultSide::Base)?;
    check_numeric(base_results, ResultSide::Base)?;
    check_numeric(changed_results, ResultSide::Changed)?;

    let values = base_results
        .iter()
        .map(|(key, base_value)| {
            subtract(&changed_results[key], base_value)
                .map(|delta| (key.clone(), delta))
                .ok_or_else(|| DiffError::NonFiniteDifference { key: key.clone() })
        })
        .collect::<Result<_, _>>()?;

    Ok(match metadata {
        Some((base_metadata, changed_metadata)) => DiffResult::WithMetadata {
            base_metadata: base_metadata.clone(),
            changed_metadata: changed_metadata.clone(),
            diff: values,
        },
        None => DiffResult::Flat(values),
    })
}

fn mapping<'v>(
    document: &'v Value,
    key: &str,
    side: ResultSide,
) -> Result<&'v Map<String, Value>, DiffError> {
    document
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| DiffError::InvalidTestResult {
            key: key.to_string(),
            side,
        })
}

/// Fails on the first key of `from` that `to` lacks.
fn check_keys(
    from: &Map<String, Value>,
    to: &Map<String, Value>,
    missing_side: ResultSide,
) -> Result<(), DiffError> {
    match from.keys().find(|key| !to.contains_key(*key)) {
        Some(key) => Err(DiffError::InconsistentTestResults {
            key: key.clone(),
            side: missing_side,
        }),
        None => Ok(()),
    }
}

fn check_numeric(results: &Map<String, Value>, side: ResultSide) -> Result<(), DiffError> {
    match results.iter().find(|(_, value)| !value.is_number()) {
        Some((key, _)) => Err(DiffError::InvalidTestResultType {
            key: key.clone(),
            side,
        }),
        None => Ok(()),
    }
}

/// Returns `None` when the difference is not representable in JSON.
fn subtract(changed: &Value, base: &Value) -> Option<Value> {
    if let (Some(c), Some(b)) = (changed.as_i64(), base.as_i64()) {
        if let Some(delta) = c.checked_sub(b) {
            return Some(Value::from(delta));
        }
    }
    let delta = changed.as_f64().unwrap_or_default() - base.as_f64().unwrap_or_default();
    Number::from_f64(delta).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diff_of_identical_documents_is_zero() {
        let doc = json!({"results": {"a_took_total": 12.5, "test_took": 40, "test_memory": -8}});
        let result = diff(&doc, &doc, false).unwrap();

        let expected = json!({"a_took_total": 0.0, "test_took": 0, "test_memory": 0});
        assert_eq!(serde_json::to_value(&result).unwrap(), expected);
    }

    #[test]
    fn test_diff_subtracts_base_from_changed() {
        let base = json!({"results": {"x": 10, "y": 1.5}});
        let changed = json!({"results": {"x": 4, "y": 2.0}});
        let result = diff(&base, &changed, false).unwrap();

        assert_eq!(result.values()["x"], json!(-6));
        assert_eq!(result.values()["y"], json!(0.5));
    }

    #[test]
    fn test_mixed_integer_and_float_yields_float() {
        let base = json!({"results": {"x": 1}});
        let changed = json!({"results": {"x": 2.5}});
        let result = diff(&base, &changed, false).unwrap();
        assert_eq!(result.values()["x"], json!(1.5));
    }

    #[test]
    fn test_integer_overflow_falls_back_to_float() {
        let base = json!({"results": {"x": i64::MIN}});
        let changed = json!({"results": {"x": i64::MAX}});
        let result = diff(&base, &changed, false).unwrap();
        assert!(result.values()["x"].is_f64());
    }

    #[test]
    fn test_float_overflow_names_key() {
        let base = json!({"results": {"ok": 1, "x": -1e308}});
        let changed = json!({"results": {"ok": 2, "x": 1e308}});
        let err = diff(&base, &changed, false).unwrap_err();

        assert_eq!(err, DiffError::NonFiniteDifference { key: "x".to_string() });
        assert_eq!(err.to_string(), "difference for key `x` is not a finite number");
    }

    #[test]
    fn test_key_missing_from_changed() {
        let base = json!({"results": {"x": 1}});
        let changed = json!({"results": {"y": 1}});
        let err = diff(&base, &changed, false).unwrap_err();

        assert_eq!(
            err,
            DiffError::InconsistentTestResults {
                key: "x".to_string(),
                side: ResultSide::Changed,
            }
        );
        assert_eq!(err.to_string(), "key `x` is not present in changed_result");
    }

    #[test]
    fn test_key_missing_from_base() {
        let base = json!({"results": {"x": 1}});
        let changed = json!({"results": {"x": 1, "z": 2}});
        let err = diff(&base, &changed, false).unwrap_err();
        assert_eq!(
            err,
            DiffError::InconsistentTestResults {
                key: "z".to_string(),
                side: ResultSide::Base,
            }
        );
    }

    #[test]
    fn test_non_numeric_value() {
        let base = json!({"results": {"x": "abc"}});
        let changed = json!({"results": {"x": 1}});
        let err = diff(&base, &changed, false).unwrap_err();

        assert_eq!(
            err,
            DiffError::InvalidTestResultType {
                key: "x".to_string(),
                side: ResultSide::Base,
            }
        );
    }

    #[test]
    fn test_boolean_is_not_numeric() {
        let base = json!({"results": {"x": 1}});
        let changed = json!({"results": {"x": true}});
        let err = diff(&base, &changed, false).unwrap_err();
        assert_eq!(err.to_string(), "key `x` in changed_result points to a non-numeric value");
    }

    #[test]
    fn test_structure_checked_before_types() {
        let base = json!({"results": {"x": "abc"}});
        let changed = json!({"results": {"y": 1}});
        let err = diff(&base, &changed, false).unwrap_err();
        assert!(matches!(err, DiffError::InconsistentTestResults { .. }));
    }

    #[test]
    fn test_missing_results() {
        let base = json!({"aggregate": {"x": 1}});
        let changed = json!({"results": {"x": 1}});
        let err = diff(&base, &changed, false).unwrap_err();
        assert_eq!(err.to_string(), "base_result has a missing or invalid key `results`");
    }

    #[test]
    fn test_results_must_be_mapping() {
        let base = json!({"results": {"x": 1}});
        let changed = json!({"results": [1, 2]});
        let err = diff(&base, &changed, false).unwrap_err();
        assert_eq!(
            err,
            DiffError::InvalidTestResult {
                key: "results".to_string(),
                side: ResultSide::Changed,
            }
        );
    }

    #[test]
    fn test_metadata_checked_first() {
        let base = json!({"metadata": {"host": "a"}});
        let changed = json!({"results": {"x": 1}});
        let err = diff(&base, &changed, true).unwrap_err();
        assert_eq!(
            err,
            DiffError::InvalidTestResult {
                key: "metadata".to_string(),
                side: ResultSide::Changed,
            }
        );
    }

    #[test]
    fn test_metadata_ignored_unless_requested() {
        let base = json!({"results": {"x": 1}});
        let result = diff(&base, &base, false).unwrap();
        assert!(matches!(result, DiffResult::Flat(_)));
    }

    #[test]
    fn test_diff_with_metadata() {
        let base = json!({"metadata": {"run": "base"}, "results": {"x": 3}});
        let changed = json!({"metadata": {"run": "new"}, "results": {"x": 5}});
        let result = diff(&base, &changed, true).unwrap();

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "base_metadata": {"run": "base"},
                "changed_metadata": {"run": "new"},
                "diff": {"x": 2}
            })
        );
    }
}
