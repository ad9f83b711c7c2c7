pub mod probe;
pub mod scenario;
pub mod types;

pub use scenario::run_scenario;
pub use types::{HarnessError, HarnessResult, ProbeSpec, ScenarioConfig, StepConfig};
