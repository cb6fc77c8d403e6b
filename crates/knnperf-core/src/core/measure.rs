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

//! Measurement strategies applied around a step's action.
//!
//! A [`Measure`] turns an action into a wrapped action that runs the
//! inner action and merges one numeric field into its JSON result. Strategies
//! compose left-to-right: the first measure in a list wraps the bare action,
//! each following measure wraps the previous composition.

use crate::core::timer::Timer;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// A deferred unit of work returning the adapter's JSON response.
pub type Action<'a> = Box<dyn FnOnce() -> Result<Value> + 'a>;

/// A named numeric quantity recorded for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    /// Wall-clock duration of the action in milliseconds.
    Took,
    /// Resident memory delta of the process across the action, in bytes.
    Memory,
}

impl Measure {
    /// Every supported measure.
    pub const ALL: [Measure; 2] = [Measure::Took, Measure::Memory];

    /// Returns the field name under which the measure is recorded.
    pub fn name(&self) -> &'static str {
        match self {
            Measure::Took => "took",
            Measure::Memory => "memory",
        }
    }

    /// Wraps `action` so that its result carries this measure.
    pub fn wrap<'a>(self, action: Action<'a>) -> Action<'a> {
        match self {
            Measure::Took => took(action),
            Measure::Memory => memory(action),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coerces an action result into a mapping; anything else becomes empty.
pub(crate) fn into_record(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Times the action. A `took` already reported by the action wins.
pub fn took<'a>(action: Action<'a>) -> Action<'a> {
    Box::new(move || {
        let mut timer = Timer::new();
        timer.start();
        let result = action()?;
        let elapsed = timer.end()?;

        let mut record = into_record(result);
        if !record.contains_key(Measure::Took.name()) {
            record.insert(Measure::Took.name().to_string(), Value::from(elapsed));
        }
        Ok(Value::Object(record))
    })
}

/// Records the change in process resident memory across the action.
///
/// The field is omitted when either sample is unavailable.
pub fn memory<'a>(action: Action<'a>) -> Action<'a> {
    sampled_memory(action, resident_memory)
}

fn sampled_memory<'a>(action: Action<'a>, sample: fn() -> Option<u64>) -> Action<'a> {
    Box::new(move || {
        let before = sample();
        let result = action()?;
        let after = sample();

        let mut record = into_record(result);
        if let (Some(before), Some(after)) = (before, after) {
            record.insert(
                Measure::Memory.name().to_string(),
                Value::from(after as i64 - before as i64),
            );
        }
        Ok(Value::Object(record))
    })
}

/// Returns the resident set size of the current process in bytes, or
/// `None` when the platform does not expose process memory.
pub fn resident_memory() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;

    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
    system.process(pid).map(|process| process.memory())
}
