//! flowpoint - condition polling and flow orchestration for end-to-end UI tests.
//!
//! This crate provides:
//! - A condition poller that turns flaky, eventually-true probes into
//!   bounded-time verdicts (blocking and async)
//! - Flows of critical and soft steps with soft-assertion finalization
//! - An append-only outcome recorder with pluggable reporters
//! - Declarative JSON scenarios over command and file probes
//! - Report sessions for organized output files
//!
//! # Example
//!
//! ```rust,no_run
//! use flowpoint::{Flow, PollPolicy, poll_until};
//!
//! let mut flow = Flow::traced("purchase");
//! flow.critical_step("store page loads", || {
//!     poll_until(|| Ok(store_is_visible()), &PollPolicy::default())
//! });
//! flow.soft_step("price shows discount", || Ok::<_, String>(discount_shown()));
//! let summary = flow.finalize_and_assert().unwrap();
//! println!("{}", summary);
//! # fn store_is_visible() -> bool { true }
//! # fn discount_shown() -> bool { true }
//! ```

pub mod config;
pub mod flow;
pub mod harness;
pub mod poll;
pub mod runner;
pub mod session;

// Re-export poller types
pub use poll::{
    Clock, ManualClock, PollError, PollOutcome, PollPolicy, PollResult, Poller, ProbeError,
    SystemClock, poll_async, poll_until, poll_until_async, wait_for,
};

// Re-export flow types
pub use flow::{
    Flow, FlowError, FlowResult, FlowStatus, JsonFileReporter, NullReporter, OutcomeRecorder,
    ReportError, Reporter, StepOutcome, Summary, TracingReporter, load_summary,
};

// Re-export harness types
pub use harness::{HarnessError, HarnessResult, ProbeSpec, ScenarioConfig, StepConfig, run_scenario};

pub use runner::RunResult;

// Re-export session management
pub use session::{Session, cleanup_old_sessions, cleanup_old_sessions_in, list_sessions, list_sessions_in};
