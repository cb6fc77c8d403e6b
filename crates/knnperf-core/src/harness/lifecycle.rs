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

//! Test lifecycle.
//!
//! A performance test is a sequence of steps bracketed by an unprofiled
//! setup and cleanup phase. [`PerfTest`] is the interface implemented by
//! each concrete test; [`TestExecution`] drives one through
//! `Created → Setup → Running → Cleanup → Done` and aggregates the steps.
//!
//! Cleanup is guaranteed once setup has begun: it runs whether the steps
//! succeed or fail, so resources acquired in setup (an index on a cluster,
//! an in-process index handle) are always released.

use crate::core::measure::Measure;
use crate::error::Result;
use crate::harness::aggregator::{aggregate_steps, AggregateResult};
use crate::harness::step::StepResult;
use tracing::{debug, warn};

/// A named sequence of profiled steps with setup and cleanup phases.
pub trait PerfTest {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Prepares fixtures. Not profiled.
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs the profiled steps and returns their results in order.
    fn run_steps(&mut self) -> Result<Vec<StepResult>>;

    /// Releases fixtures. Not profiled.
    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: PerfTest + ?Sized> PerfTest for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn setup(&mut self) -> Result<()> {
        (**self).setup()
    }

    fn run_steps(&mut self) -> Result<Vec<StepResult>> {
        (**self).run_steps()
    }

    fn cleanup(&mut self) -> Result<()> {
        (**self).cleanup()
    }
}

/// Lifecycle phase of a [`TestExecution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestState {
    /// Constructed, not yet executed.
    Created,
    /// Preparing fixtures.
    Setup,
    /// Running profiled steps.
    Running,
    /// Releasing fixtures.
    Cleanup,
    /// Finished; the aggregate (or the error) has been returned.
    Done,
}

/// Drives a [`PerfTest`] through its lifecycle.
#[derive(Debug)]
pub struct TestExecution<T> {
    test: T,
    measures: Vec<Measure>,
    state: TestState,
}

impl<T: PerfTest> TestExecution<T> {
    /// Wraps `test`, aggregating the given measures.
    pub fn new(test: T, measures: &[Measure]) -> Self {
        Self {
            test,
            measures: measures.to_vec(),
            state: TestState::Created,
        }
    }

    /// Returns the current lifecycle phase.
    pub fn state(&self) -> TestState {
        self.state
    }

    /// Returns the wrapped test.
    pub fn test(&self) -> &T {
        &self.test
    }

    /// Runs setup, the steps and cleanup, then aggregates the step results.
    ///
    /// Step results are buffered per call, so executing the same instance
    /// again re-runs every phase without accumulating earlier results.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by setup or the steps. A cleanup
    /// error is returned only if everything before it succeeded; otherwise
    /// it is logged and the earlier error wins.
    pub fn execute(&mut self) -> Result<AggregateResult> {
        self.transition(TestState::Setup);
        if let Err(err) = self.test.setup() {
            // The setup error wins; a cleanup failure is already logged.
            let _ = self.release();
            return Err(err);
        }

        self.transition(TestState::Running);
        let outcome = self.test.run_steps();
        let cleaned = self.release();

        let steps = match (outcome, cleaned) {
            (Ok(steps), Ok(())) => steps,
            (Ok(_), Err(err)) => return Err(err),
            (Err(err), _) => return Err(err),
        };
        Ok(aggregate_steps(&steps, &self.measures))
    }

    fn release(&mut self) -> Result<()> {
        self.transition(TestState::Cleanup);
        let cleaned = self.test.cleanup();
        if let Err(err) = &cleaned {
            warn!(test = self.test.name(), error = %err, "cleanup failed");
        }
        self.transition(TestState::Done);
        cleaned
    }

    fn transition(&mut self, next: TestState) {
        debug!(test = self.test.name(), from = ?self.state, to = ?next, "test state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PerfError;
    use crate::harness::step::Step;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        fail_setup: bool,
        fail_steps: bool,
        fail_cleanup: bool,
    }

    impl PerfTest for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn setup(&mut self) -> Result<()> {
            self.calls.push("setup");
            if self.fail_setup {
                return Err(PerfError::adapter("fake", "setup failed"));
            }
            Ok(())
        }

        fn run_steps(&mut self) -> Result<Vec<StepResult>> {
            self.calls.push("run_steps");
            if self.fail_steps {
                return Err(PerfError::adapter("fake", "step failed"));
            }
            let step = Step::new("query_index", &[Measure::Took])?;
            Ok(vec![
                step.execute(|| Ok(json!({"took": 4})))?,
                step.execute(|| Ok(json!({"took": 6})))?,
            ])
        }

        fn cleanup(&mut self) -> Result<()> {
            self.calls.push("cleanup");
            if self.fail_cleanup {
                return Err(PerfError::adapter("fake", "cleanup failed"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_phases_run_in_order() {
        let mut execution = TestExecution::new(Recorder::default(), &[Measure::Took]);
        assert_eq!(execution.state(), TestState::Created);

        let aggregate = execution.execute().unwrap();
        assert_eq!(execution.test().calls, vec!["setup", "run_steps", "cleanup"]);
        assert_eq!(execution.state(), TestState::Done);
        assert_eq!(aggregate.get("query_index_took_total"), Some(10.0));
        assert_eq!(aggregate.get("test_took"), Some(10.0));
    }

    #[test]
    fn test_second_execute_does_not_double_count() {
        let mut execution = TestExecution::new(Recorder::default(), &[Measure::Took]);
        let first = execution.execute().unwrap();
        let second = execution.execute().unwrap();

        assert_eq!(first, second);
        assert_eq!(second.get("query_index_took_total"), Some(10.0));
        assert_eq!(execution.test().calls.len(), 6);
    }

    #[test]
    fn test_cleanup_runs_after_step_failure() {
        let recorder = Recorder {
            fail_steps: true,
            ..Recorder::default()
        };
        let mut execution = TestExecution::new(recorder, &[Measure::Took]);

        let err = execution.execute().unwrap_err();
        assert_eq!(err, PerfError::adapter("fake", "step failed"));
        assert_eq!(execution.test().calls, vec!["setup", "run_steps", "cleanup"]);
        assert_eq!(execution.state(), TestState::Done);
    }

    #[test]
    fn test_step_failure_wins_over_cleanup_failure() {
        let recorder = Recorder {
            fail_steps: true,
            fail_cleanup: true,
            ..Recorder::default()
        };
        let err = TestExecution::new(recorder, &[Measure::Took]).execute().unwrap_err();
        assert_eq!(err, PerfError::adapter("fake", "step failed"));
    }

    #[test]
    fn test_cleanup_failure_fails_successful_run() {
        let recorder = Recorder {
            fail_cleanup: true,
            ..Recorder::default()
        };
        let err = TestExecution::new(recorder, &[Measure::Took]).execute().unwrap_err();
        assert_eq!(err, PerfError::adapter("fake", "cleanup failed"));
    }

    #[test]
    fn test_setup_failure_skips_steps_but_cleans_up() {
        let recorder = Recorder {
            fail_setup: true,
            ..Recorder::default()
        };
        let mut execution = TestExecution::new(recorder, &[Measure::Took]);

        let err = execution.execute().unwrap_err();
        assert_eq!(err, PerfError::adapter("fake", "setup failed"));
        assert_eq!(execution.test().calls, vec!["setup", "cleanup"]);
    }

    #[test]
    fn test_boxed_test_executes() {
        let boxed: Box<dyn PerfTest> = Box::new(Recorder::default());
        let aggregate = TestExecution::new(boxed, &[Measure::Took]).execute().unwrap();
        assert_eq!(aggregate.get("test_took"), Some(10.0));
    }
}
