use tracing::info;

use super::types::{HarnessError, HarnessResult, ScenarioConfig};
use crate::config;
use crate::flow::{Flow, FlowError, Reporter, Summary};

/// Runs every step of `config` as a polled flow step.
/// Steps without a policy fall back to the environment-configured default.
/// Returns the summary when all steps passed.
pub fn run_scenario<R: Reporter>(config: &ScenarioConfig, reporter: R) -> HarnessResult<Summary> {
    info!(scenario = config.name.as_str(), steps = config.steps.len(), "running scenario");

    let defaults = config::get();
    let mut flow = Flow::new(config.name.clone(), reporter);
    for step in &config.steps {
        let policy = config.resolve_policy(step, defaults);
        let probe = &step.probe;
        flow.wait_step(step.description.clone(), step.critical, || probe.evaluate(), &policy);
    }

    flow.finalize_and_assert().map_err(|err| match err {
        FlowError::AssertionFailure { summary } => HarnessError::Assertion(summary),
    })
}
