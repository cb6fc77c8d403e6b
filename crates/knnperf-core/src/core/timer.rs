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

//! Wall-clock stopwatch for step timing.
//!
//! Timing is decoupled from construction: steps may be built long before
//! they run, so a [`Timer`] only starts measuring when [`Timer::start`] is
//! called.

use crate::error::{PerfError, Result};
use std::time::Instant;

/// A monotonic stopwatch reporting elapsed milliseconds.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    started_at: Option<Instant>,
}

impl Timer {
    /// Creates a timer that has not been started.
    pub fn new() -> Self {
        Self { started_at: None }
    }

    /// Records the reference point for subsequent [`Timer::end`] calls.
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Returns the milliseconds elapsed since the last [`Timer::start`].
    ///
    /// Does not restart the timer; repeated calls return non-decreasing
    /// readings against the same reference point.
    ///
    /// # Errors
    ///
    /// Returns [`PerfError::TimerNotStarted`] if the timer was never started.
    pub fn end(&self) -> Result<f64> {
        let started_at = self.started_at.ok_or(PerfError::TimerNotStarted)?;
        Ok(started_at.elapsed().as_secs_f64() * 1_000.0)
    }

    /// Returns whether [`Timer::start`] has been called.
    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }
}
