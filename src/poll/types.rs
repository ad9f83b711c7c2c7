// Core types for condition polling

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::{Config, DEFAULT_INTERVAL_MS, DEFAULT_TIMEOUT_MS};

/// Result type for poll operations that can time out
pub type PollResult<T> = Result<T, PollError>;

/// Error raised by a probe evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The observed state is mid-transition; treated as "not yet satisfied"
    #[error("transient probe error: {0}")]
    Transient(String),

    /// A genuine defect that retrying cannot fix; propagates immediately
    #[error("fatal probe error: {0}")]
    Fatal(String),
}

impl ProbeError {
    pub fn transient(msg: impl Into<String>) -> Self {
        ProbeError::Transient(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        ProbeError::Fatal(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ProbeError::Transient(_))
    }
}

/// Error raised by [`wait_for`](super::wait_for)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("timed out after {timeout:?} ({attempts} attempts) waiting for {condition}")]
    Timeout {
        condition: String,
        timeout: Duration,
        attempts: u32,
    },

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Deadline/interval policy for a poll.
///
/// Durations serialize as `*_ms` integer fields; missing fields take the
/// built-in defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    #[serde(rename = "timeout_ms", with = "millis", default = "default_timeout")]
    pub timeout: Duration,

    #[serde(rename = "interval_ms", with = "millis", default = "default_interval")]
    pub interval: Duration,

    #[serde(rename = "initial_delay_ms", with = "millis", default)]
    pub initial_delay: Duration,

    /// Swallow fatal probe errors as well as transient ones
    #[serde(default)]
    pub tolerate_all_errors: bool,
}

fn default_timeout() -> Duration {
    Duration::from_millis(DEFAULT_TIMEOUT_MS)
}

fn default_interval() -> Duration {
    Duration::from_millis(DEFAULT_INTERVAL_MS)
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            interval: default_interval(),
            initial_delay: Duration::ZERO,
            tolerate_all_errors: false,
        }
    }
}

impl PollPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            ..Default::default()
        }
    }

    /// Short wait for elements expected almost immediately
    pub fn quick() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_millis(250))
    }

    /// Long wait for slow transitions such as downloads or logins
    pub fn patient() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(1))
    }

    /// Default timings, tolerating every probe error (stale references during
    /// transitions and the like)
    pub fn stable() -> Self {
        Self::default().tolerate_all_errors(true)
    }

    /// Default policy taken from environment configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_millis(config.poll.timeout_ms),
            interval: Duration::from_millis(config.poll.interval_ms),
            initial_delay: Duration::from_millis(config.poll.initial_delay_ms),
            tolerate_all_errors: false,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn tolerate_all_errors(mut self, tolerate: bool) -> Self {
        self.tolerate_all_errors = tolerate;
        self
    }

    /// Whether `err` counts as "not yet satisfied" under this policy
    pub fn tolerates(&self, err: &ProbeError) -> bool {
        self.tolerate_all_errors || err.is_transient()
    }
}

/// Detailed result of a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Whether some evaluation returned `true`
    pub satisfied: bool,
    /// Number of probe evaluations performed
    pub attempts: u32,
    /// Time from poll start (including the initial delay) to return
    pub elapsed: Duration,
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
