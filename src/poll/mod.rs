pub mod asynchronous;
pub mod clock;
pub mod poller;
pub mod types;

pub use asynchronous::{poll_async, poll_until_async};
pub use clock::{Clock, ManualClock, SystemClock};
pub use poller::{Poller, poll_until, wait_for};
pub use types::{PollError, PollOutcome, PollPolicy, PollResult, ProbeError};
