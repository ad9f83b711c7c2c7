use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::Config;
use crate::flow::Summary;
use crate::poll::PollPolicy;

/// A declarative flow: steps evaluated in order against live system state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Name of the flow (used for reports)
    pub name: String,

    /// Poll policy for steps that do not set their own.
    /// When absent, the configured default policy applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PollPolicy>,

    /// Steps to run, in order
    pub steps: Vec<StepConfig>,
}

impl ScenarioConfig {
    /// Load a scenario from a JSON file
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Policy for `step`: its own, else the scenario's, else the one built
    /// from `defaults`
    pub fn resolve_policy(&self, step: &StepConfig, defaults: &Config) -> PollPolicy {
        step.policy
            .or(self.policy)
            .unwrap_or_else(|| PollPolicy::from_config(defaults))
    }
}

/// Configuration for a single scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// What this step verifies
    pub description: String,

    /// Whether a failure of this step aborts the scenario
    #[serde(default)]
    pub critical: bool,

    /// Condition to poll for
    pub probe: ProbeSpec,

    /// Overrides the scenario policy for this step
    #[serde(default)]
    pub policy: Option<PollPolicy>,
}

/// Condition a step waits for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeSpec {
    /// Run a command; satisfied when it exits with status 0
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },

    /// Satisfied when the path exists
    FileExists { path: PathBuf },

    /// Satisfied when the file exists and contains `needle`
    FileContains { path: PathBuf, needle: String },
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error types for harness operations
#[derive(Debug, Error)]
pub enum HarnessError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed scenario file
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The scenario ran and at least one step failed
    #[error("scenario '{}' failed: {} of {} steps failed", .0.flow, .0.failed_count, .0.total)]
    Assertion(Box<Summary>),
}
