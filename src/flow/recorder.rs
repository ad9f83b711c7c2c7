//! Append-only store of step outcomes.

use super::types::{FlowStatus, StepOutcome, Summary};

/// Ordered, append-only record of the outcomes of one flow
#[derive(Debug, Clone, Default)]
pub struct OutcomeRecorder {
    outcomes: Vec<StepOutcome>,
}

impl OutcomeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome. Earlier entries are never touched.
    pub fn record(&mut self, outcome: StepOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Aggregate the recorded outcomes. Pure: repeated calls without an
    /// intervening `record` return equal summaries.
    pub fn summarize(&self, flow: &str, status: FlowStatus) -> Summary {
        let mut passed_count = 0;
        let mut skipped_count = 0;
        let mut critical_failures = 0;

        for outcome in &self.outcomes {
            if outcome.passed {
                passed_count += 1;
            }
            if outcome.skipped {
                skipped_count += 1;
            }
            if outcome.is_critical_failure() {
                critical_failures += 1;
            }
        }

        Summary {
            flow: flow.to_string(),
            status,
            total: self.outcomes.len(),
            passed_count,
            failed_count: self.outcomes.len() - passed_count,
            skipped_count,
            critical_failures,
            outcomes: self.outcomes.clone(),
        }
    }
}
