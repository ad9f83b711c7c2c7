use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error annotation recorded for steps skipped after an abort
pub const SKIPPED_AFTER_ABORT: &str = "skipped: flow aborted after critical failure";

/// Error annotation recorded for steps run after the flow was finalized
pub const SKIPPED_AFTER_FINALIZE: &str = "skipped: flow already finalized";

/// Execution state of a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    /// Steps are still being executed
    Running,
    /// A critical step failed; later steps are recorded as skipped
    Aborted,
    /// The flow was finalized without a critical failure
    Completed,
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowStatus::Running => "RUNNING",
            FlowStatus::Aborted => "ABORTED",
            FlowStatus::Completed => "COMPLETED",
        };
        f.write_str(label)
    }
}

/// Result of a single flow step. Written once, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Position in the flow (1-based)
    pub index: usize,

    /// Step description as given by the caller
    pub description: String,

    pub passed: bool,

    /// Whether a failure of this step aborts the flow
    pub critical: bool,

    /// The step function was not invoked because the flow had aborted
    pub skipped: bool,

    /// Error or panic message captured from the step, if any
    pub error: Option<String>,

    /// Wall time spent in the step function
    pub elapsed_ms: u64,

    /// When the outcome was recorded
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub recorded_at: DateTime<Utc>,
}

impl StepOutcome {
    /// Whether this outcome is the failure that aborted its flow
    pub fn is_critical_failure(&self) -> bool {
        self.critical && !self.passed && !self.skipped
    }

    fn verdict(&self) -> &'static str {
        if self.skipped {
            "SKIP"
        } else if self.passed {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.index, self.verdict())?;
        if self.critical {
            write!(f, " (critical)")?;
        }
        write!(f, " {}", self.description)?;
        if let Some(error) = &self.error {
            if !self.skipped {
                write!(f, ": {}", error)?;
            }
        }
        Ok(())
    }
}

/// Aggregate view over all outcomes recorded for a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub flow: String,
    pub status: FlowStatus,
    pub total: usize,
    pub passed_count: usize,
    /// Failed outcomes, skipped ones included
    pub failed_count: usize,
    pub skipped_count: usize,
    /// Critical steps that ran and failed (at most one per flow)
    pub critical_failures: usize,
    /// Outcomes in execution order
    pub outcomes: Vec<StepOutcome>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed_count == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    /// Failures that were recorded without stopping the flow
    pub fn soft_failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed && !o.skipped && !o.critical)
    }

    /// The failure that caused the flow to abort, if any
    pub fn critical_failure(&self) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| o.is_critical_failure())
    }

    pub fn descriptions(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.description.as_str()).collect()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "flow '{}' {}: {} steps, {} passed, {} failed ({} skipped)",
            self.flow, self.status, self.total, self.passed_count, self.failed_count, self.skipped_count
        )?;
        for outcome in &self.outcomes {
            writeln!(f, "  {}", outcome)?;
        }
        if let Some(cause) = self.critical_failure() {
            writeln!(f, "aborted at step {}: {}", cause.index, cause.description)?;
        }
        Ok(())
    }
}

/// Result type for flow finalization
pub type FlowResult<T> = Result<T, FlowError>;

/// Error raised when finalizing a flow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// At least one recorded step failed
    #[error("flow '{}' failed: {} of {} steps failed", .summary.flow, .summary.failed_count, .summary.total)]
    AssertionFailure { summary: Box<Summary> },
}

impl FlowError {
    pub fn summary(&self) -> &Summary {
        match self {
            FlowError::AssertionFailure { summary } => summary,
        }
    }
}
