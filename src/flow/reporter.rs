//! Reporting sinks for flow outcomes.
//!
//! A `Reporter` is injected into each [`Flow`](super::Flow), so a test decides
//! where flow points go:
//! - `TracingReporter` logs each step through `tracing`
//! - `JsonFileReporter` writes the final summary as pretty JSON
//! - `NullReporter` discards everything

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

use super::types::{StepOutcome, Summary};

/// Error writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for outcome sinks
pub trait Reporter {
    /// Called once per recorded outcome, in execution order
    fn step_recorded(&mut self, _outcome: &StepOutcome) {}

    /// Called when the flow is finalized
    fn flow_finished(&mut self, summary: &Summary) -> Result<(), ReportError>;
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn step_recorded(&mut self, outcome: &StepOutcome) {
        (**self).step_recorded(outcome)
    }

    fn flow_finished(&mut self, summary: &Summary) -> Result<(), ReportError> {
        (**self).flow_finished(summary)
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn step_recorded(&mut self, outcome: &StepOutcome) {
        (**self).step_recorded(outcome)
    }

    fn flow_finished(&mut self, summary: &Summary) -> Result<(), ReportError> {
        (**self).flow_finished(summary)
    }
}

/// Fan out to two reporters. Both are always invoked; the first error wins.
impl<A: Reporter, B: Reporter> Reporter for (A, B) {
    fn step_recorded(&mut self, outcome: &StepOutcome) {
        self.0.step_recorded(outcome);
        self.1.step_recorded(outcome);
    }

    fn flow_finished(&mut self, summary: &Summary) -> Result<(), ReportError> {
        let first = self.0.flow_finished(summary);
        let second = self.1.flow_finished(summary);
        first.and(second)
    }
}

/// Flow-point logging through `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
    flow: String,
}

impl TracingReporter {
    pub fn new(flow: impl Into<String>) -> Self {
        Self { flow: flow.into() }
    }
}

impl Reporter for TracingReporter {
    fn step_recorded(&mut self, outcome: &StepOutcome) {
        let flow = self.flow.as_str();
        if outcome.skipped {
            warn!(flow, step = outcome.index, "skipped: {}", outcome.description);
        } else if outcome.passed {
            info!(flow, step = outcome.index, elapsed_ms = outcome.elapsed_ms, "passed: {}", outcome.description);
        } else if outcome.critical {
            error!(
                flow,
                step = outcome.index,
                error = outcome.error.as_deref().unwrap_or(""),
                "critical step failed: {}",
                outcome.description
            );
        } else {
            warn!(
                flow,
                step = outcome.index,
                error = outcome.error.as_deref().unwrap_or(""),
                "failed: {}",
                outcome.description
            );
        }
    }

    fn flow_finished(&mut self, summary: &Summary) -> Result<(), ReportError> {
        info!(
            flow = summary.flow.as_str(),
            status = %summary.status,
            total = summary.total,
            passed = summary.passed_count,
            failed = summary.failed_count,
            skipped = summary.skipped_count,
            "flow finished"
        );
        Ok(())
    }
}

/// Writes the final summary to a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileReporter {
    path: PathBuf,
}

impl JsonFileReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reporter for JsonFileReporter {
    fn flow_finished(&mut self, summary: &Summary) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(summary)?)?;
        Ok(())
    }
}

/// Reporter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn flow_finished(&mut self, _summary: &Summary) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Load a summary previously written by [`JsonFileReporter`]
pub fn load_summary(path: &Path) -> Result<Summary, ReportError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
