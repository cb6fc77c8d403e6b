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

//! Profiled units of work.
//!
//! A [`Step`] wraps an externally performed action (an index creation, a
//! bulk request, a query, ...) with its configured measures and labels the
//! outcome. Actions return the adapter's JSON response; a response that is
//! not a mapping is treated as an empty record so that actions whose real
//! effect is external still take part in profiling.

use crate::core::measure::{into_record, Action, Measure};
use crate::error::{PerfError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// The labeled, profiled outcome of one step invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// Identity of the step that produced this record.
    pub label: String,
    /// Response fields plus the injected measures.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StepResult {
    /// Creates a record from a label and the fields it carries.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `label` is empty.
    pub fn new(label: impl Into<String>, mut fields: Map<String, Value>) -> Result<Self> {
        let label = check_label(label.into())?;
        fields.remove("label");
        Ok(Self { label, fields })
    }

    /// Returns the numeric value recorded under `name`, if any.
    pub fn measure(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }
}

/// A named unit of work profiled with an ordered list of measures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    label: String,
    measures: Vec<Measure>,
}

impl Step {
    /// Creates a step. Measures are applied in the order given.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `label` is empty.
    pub fn new(label: impl Into<String>, measures: &[Measure]) -> Result<Self> {
        Ok(Self {
            label: check_label(label.into())?,
            measures: measures.to_vec(),
        })
    }

    /// Returns the step label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the measures applied by this step.
    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    /// Runs `action` wrapped in this step's measures and labels the result.
    ///
    /// # Errors
    ///
    /// Errors raised by the action propagate unchanged; steps are never
    /// retried.
    pub fn execute<'a, F>(&self, action: F) -> Result<StepResult>
    where
        F: FnOnce() -> Result<Value> + 'a,
    {
        let profiled = self
            .measures
            .iter()
            .fold(Box::new(action) as Action<'a>, |inner, measure| measure.wrap(inner));

        let result = StepResult::new(self.label.clone(), into_record(profiled()?))?;
        debug!(step = %self.label, took = ?result.measure("took"), "step finished");
        Ok(result)
    }
}

fn check_label(label: String) -> Result<String> {
    if label.is_empty() {
        return Err(PerfError::configuration("step label must not be empty"));
    }
    Ok(label)
}
