pub mod orchestrator;
pub mod recorder;
pub mod reporter;
pub mod types;

pub use orchestrator::Flow;
pub use recorder::OutcomeRecorder;
pub use reporter::{JsonFileReporter, NullReporter, ReportError, Reporter, TracingReporter, load_summary};
pub use types::{FlowError, FlowResult, FlowStatus, SKIPPED_AFTER_ABORT, SKIPPED_AFTER_FINALIZE, StepOutcome, Summary};
