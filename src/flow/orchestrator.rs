//! Flow orchestration with critical and soft steps.
//!
//! Each step yields a pass/fail verdict that is recorded rather than
//! returned as an error. A failing critical step aborts the flow: every later
//! step is recorded as skipped without running. `finalize_and_assert` fails
//! if any recorded step failed, after every step had its chance to run.
//! Once finalized, the status is terminal: later steps are recorded as
//! skipped and the reporter is not told about the finish a second time.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use super::recorder::OutcomeRecorder;
use super::reporter::{Reporter, TracingReporter};
use super::types::{
    FlowError, FlowResult, FlowStatus, SKIPPED_AFTER_ABORT, SKIPPED_AFTER_FINALIZE, StepOutcome, Summary,
};
use crate::poll::{Clock, PollPolicy, Poller, ProbeError};

/// One end-to-end scenario: an ordered sequence of recorded steps
#[derive(Debug)]
pub struct Flow<R = TracingReporter> {
    name: String,
    status: FlowStatus,
    finalized: bool,
    recorder: OutcomeRecorder,
    reporter: R,
}

impl Flow<TracingReporter> {
    /// Flow that reports through `tracing`
    pub fn traced(name: impl Into<String>) -> Self {
        let name = name.into();
        let reporter = TracingReporter::new(name.clone());
        Self::new(name, reporter)
    }
}

impl<R: Reporter> Flow<R> {
    pub fn new(name: impl Into<String>, reporter: R) -> Self {
        Self {
            name: name.into(),
            status: FlowStatus::Running,
            finalized: false,
            recorder: OutcomeRecorder::new(),
            reporter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    pub fn is_aborted(&self) -> bool {
        self.status == FlowStatus::Aborted
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Run one step and record its outcome.
    ///
    /// Errors and panics from `step` become failed outcomes with the message
    /// kept in `StepOutcome::error`. After an abort or after finalization,
    /// `step` is not invoked and the status does not change.
    /// Returns whether the step passed.
    pub fn run_step<F, E>(&mut self, description: impl Into<String>, critical: bool, step: F) -> bool
    where
        F: FnOnce() -> Result<bool, E>,
        E: fmt::Display,
    {
        let description = description.into();

        if self.finalized {
            warn!(flow = self.name.as_str(), step = description.as_str(), "step after finalize, skipping");
            self.push(description, critical, false, true, Some(SKIPPED_AFTER_FINALIZE.to_string()), 0);
            return false;
        }
        if self.is_aborted() {
            self.push(description, critical, false, true, Some(SKIPPED_AFTER_ABORT.to_string()), 0);
            return false;
        }

        let started = Instant::now();
        let (passed, error) = match catch_unwind(AssertUnwindSafe(step)) {
            Ok(Ok(passed)) => (passed, None),
            Ok(Err(err)) => (false, Some(err.to_string())),
            Err(payload) => (false, Some(format!("panicked: {}", panic_message(payload.as_ref())))),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.push(description, critical, passed, false, error, elapsed_ms);

        if critical && !passed {
            self.status = FlowStatus::Aborted;
        }
        passed
    }

    /// Step whose failure is recorded without stopping the flow
    pub fn soft_step<F, E>(&mut self, description: impl Into<String>, step: F) -> bool
    where
        F: FnOnce() -> Result<bool, E>,
        E: fmt::Display,
    {
        self.run_step(description, false, step)
    }

    /// Step whose failure aborts the flow
    pub fn critical_step<F, E>(&mut self, description: impl Into<String>, step: F) -> bool
    where
        F: FnOnce() -> Result<bool, E>,
        E: fmt::Display,
    {
        self.run_step(description, true, step)
    }

    /// Record a verification whose result is already known (soft)
    pub fn check(&mut self, description: impl Into<String>, passed: bool) -> bool {
        self.run_step(description, false, || Ok::<_, std::convert::Infallible>(passed))
    }

    /// Step that passes once `probe` is satisfied under `policy`
    pub fn wait_step<F>(
        &mut self,
        description: impl Into<String>,
        critical: bool,
        probe: F,
        policy: &PollPolicy,
    ) -> bool
    where
        F: FnMut() -> Result<bool, ProbeError>,
    {
        self.wait_step_with(&Poller::new(), description, critical, probe, policy)
    }

    /// [`wait_step`](Self::wait_step) driven by a caller-supplied poller
    pub fn wait_step_with<C, F>(
        &mut self,
        poller: &Poller<C>,
        description: impl Into<String>,
        critical: bool,
        probe: F,
        policy: &PollPolicy,
    ) -> bool
    where
        C: Clock,
        F: FnMut() -> Result<bool, ProbeError>,
    {
        self.run_step(description, critical, || poller.poll_until(probe, policy))
    }

    /// Snapshot of all outcomes recorded so far
    pub fn summarize(&self) -> Summary {
        self.recorder.summarize(&self.name, self.status)
    }

    /// Finish the flow and fail if any recorded step failed.
    ///
    /// The summary is always handed to the reporter first, so an aborted flow
    /// still reports every outcome gathered before and after the abort.
    /// Calling it again re-checks the outcomes without reporting again.
    pub fn finalize_and_assert(&mut self) -> FlowResult<Summary> {
        if self.status == FlowStatus::Running {
            self.status = FlowStatus::Completed;
        }

        let summary = self.summarize();
        if self.finalized {
            debug!(flow = self.name.as_str(), "flow already finalized, not reporting again");
        } else {
            self.finalized = true;
            if let Err(err) = self.reporter.flow_finished(&summary) {
                warn!(flow = self.name.as_str(), error = %err, "failed to write flow report");
            }
        }

        if summary.is_success() {
            Ok(summary)
        } else {
            Err(FlowError::AssertionFailure {
                summary: Box::new(summary),
            })
        }
    }

    fn push(
        &mut self,
        description: String,
        critical: bool,
        passed: bool,
        skipped: bool,
        error: Option<String>,
        elapsed_ms: u64,
    ) {
        let outcome = StepOutcome {
            index: self.recorder.len() + 1,
            description,
            passed,
            critical,
            skipped,
            error,
            elapsed_ms,
            recorded_at: Utc::now(),
        };
        self.reporter.step_recorded(&outcome);
        self.recorder.record(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
