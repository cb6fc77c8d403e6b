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

//! Step aggregation and percentile statistics.
//!
//! Reduces the ordered step results of one run into an [`AggregateResult`]:
//!
//! - `{label}_{measure}_total`: sum of the measure over every step with that label
//! - `{label}_{measure}_p50` / `_p90` / `_p99`: nearest-rank percentiles
//! - `test_{measure}`: sum of the measure over every step
//!
//! Steps lacking a tracked measure are skipped for that measure; missing
//! values are never counted as zero.

use crate::core::measure::Measure;
use crate::harness::step::StepResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel reported when a percentile cannot be resolved.
pub const UNDEFINED_PERCENTILE: f64 = -1.0;

/// Percentiles reported for every step measure.
pub const PERCENTILES: [(&str, f64); 3] = [("p50", 0.50), ("p90", 0.90), ("p99", 0.99)];

/// Derived statistics of one run, keyed by `{label}_{measure}_{stat}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult(BTreeMap<String, f64>);

impl AggregateResult {
    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Stores `value` under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    /// Returns whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the aggregate has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for AggregateResult {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Returns the nearest-rank percentile `p` (in `[0, 1]`) of ascending values.
///
/// Returns [`UNDEFINED_PERCENTILE`] when `p` is outside `[0, 1]` or when the
/// sample is too small to resolve it, i.e. `p < 1/n` or `p > (n-1)/n`.
///
/// # Example
///
/// ```
/// use knnperf_core::harness::aggregator::percentile;
///
/// let values = [10.0, 20.0, 30.0];
/// assert_eq!(percentile(&values, 0.50), 20.0);
/// assert_eq!(percentile(&values, 0.99), -1.0);
/// ```
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return UNDEFINED_PERCENTILE;
    }

    let count = n as f64;
    let lowest = 1.0 / count;
    let highest = (count - 1.0) / count;
    if p < lowest || p > highest {
        return UNDEFINED_PERCENTILE;
    }

    let index = ((count * p).floor() as usize).min(n - 1);
    sorted[index]
}

/// Aggregates the step results of one run for the tracked measures.
pub fn aggregate_steps(steps: &[StepResult], measures: &[Measure]) -> AggregateResult {
    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut test_totals: BTreeMap<&str, f64> = BTreeMap::new();

    for step in steps {
        for measure in measures {
            let name = measure.name();
            let Some(value) = step.measure(name) else {
                continue;
            };

            buckets
                .entry(format!("{}_{}", step.label, name))
                .or_default()
                .push(value);
            *test_totals.entry(name).or_insert(0.0) += value;
        }
    }

    let mut aggregate = AggregateResult::new();
    for (key, mut values) in buckets {
        values.sort_by(f64::total_cmp);
        aggregate.insert(format!("{}_total", key), values.iter().sum());
        for (suffix, p) in PERCENTILES {
            aggregate.insert(format!("{}_{}", key, suffix), percentile(&values, p));
        }
    }
    for (name, total) in test_totals {
        aggregate.insert(format!("test_{}", name), total);
    }

    aggregate
}
