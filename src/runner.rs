//! Types for scenario run results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::flow::Summary;

/// Result of a complete scenario run, as printed by `flowpoint run --json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Whether every step passed
    pub success: bool,

    /// Error message if the run failed
    pub error: Option<String>,

    /// Where the JSON report was written
    pub report_path: Option<PathBuf>,

    /// Outcomes of the run (absent when the scenario could not be loaded)
    pub summary: Option<Summary>,
}

impl RunResult {
    pub fn passed(summary: Summary, report_path: Option<PathBuf>) -> Self {
        Self {
            success: true,
            error: None,
            report_path,
            summary: Some(summary),
        }
    }

    pub fn failed(error: impl Into<String>, summary: Option<Summary>, report_path: Option<PathBuf>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            report_path,
            summary,
        }
    }
}
