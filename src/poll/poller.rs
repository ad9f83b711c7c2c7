//! Blocking condition poller.
//!
//! Evaluates a probe until it reports `true` or the policy deadline passes.
//! The last-chance evaluation always starts at or after the deadline: when
//! the deadline passes while a probe is in flight, one more evaluation runs
//! immediately, without sleeping. A poll therefore ends within
//! `max(initial_delay, timeout) + interval` plus at most two probe latencies.
//! The deadline is only checked between evaluations, so a probe that blocks
//! forever blocks the poll forever too.

use std::time::Duration;
use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};
use super::types::{PollError, PollOutcome, PollPolicy, PollResult, ProbeError};

/// Condition poller over a [`Clock`]
#[derive(Debug, Clone, Default)]
pub struct Poller<C = SystemClock> {
    clock: C,
}

impl Poller<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> Poller<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Poll `probe` under `policy`, returning attempt count and elapsed time.
    ///
    /// Fatal probe errors (unless the policy tolerates all errors) abort the
    /// poll immediately without retry.
    pub fn poll<F>(&self, mut probe: F, policy: &PollPolicy) -> Result<PollOutcome, ProbeError>
    where
        F: FnMut() -> Result<bool, ProbeError>,
    {
        let start = self.clock.now();
        if !policy.initial_delay.is_zero() {
            self.clock.sleep(policy.initial_delay);
        }

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let started = self.clock.now().saturating_duration_since(start);
            let satisfied = match probe() {
                Ok(value) => value,
                Err(err) if policy.tolerates(&err) => {
                    trace!(attempt = attempts, error = %err, "probe error tolerated");
                    false
                }
                Err(err) => {
                    debug!(attempt = attempts, error = %err, "probe error is fatal, aborting poll");
                    return Err(err);
                }
            };

            let elapsed = self.clock.now().saturating_duration_since(start);
            if satisfied {
                debug!(attempts, elapsed_ms = elapsed.as_millis() as u64, "condition satisfied");
                return Ok(PollOutcome {
                    satisfied: true,
                    attempts,
                    elapsed,
                });
            }

            if elapsed >= policy.timeout {
                if started < policy.timeout {
                    trace!(attempt = attempts, "deadline passed during evaluation, evaluating once more");
                    continue;
                }
                debug!(
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    timeout_ms = policy.timeout.as_millis() as u64,
                    "condition not satisfied before deadline"
                );
                return Ok(PollOutcome {
                    satisfied: false,
                    attempts,
                    elapsed,
                });
            }

            self.clock.sleep(policy.interval);
        }
    }

    /// Poll and return only whether the condition was satisfied
    pub fn poll_until<F>(&self, probe: F, policy: &PollPolicy) -> Result<bool, ProbeError>
    where
        F: FnMut() -> Result<bool, ProbeError>,
    {
        self.poll(probe, policy).map(|outcome| outcome.satisfied)
    }

    /// Poll an infallible probe
    pub fn poll_until_bool<F>(&self, mut probe: F, policy: &PollPolicy) -> bool
    where
        F: FnMut() -> bool,
    {
        // An infallible probe never produces an error to propagate.
        self.poll(|| Ok(probe()), policy)
            .map(|outcome| outcome.satisfied)
            .unwrap_or(false)
    }

    /// Poll and turn an unsatisfied result into [`PollError::Timeout`]
    pub fn wait_for<F>(&self, condition: &str, probe: F, policy: &PollPolicy) -> PollResult<()>
    where
        F: FnMut() -> Result<bool, ProbeError>,
    {
        let outcome = self.poll(probe, policy)?;
        if outcome.satisfied {
            Ok(())
        } else {
            Err(PollError::Timeout {
                condition: condition.to_string(),
                timeout: policy.timeout,
                attempts: outcome.attempts,
            })
        }
    }
}

/// Poll `probe` on the system clock until it returns `true` or `policy` times out
pub fn poll_until<F>(probe: F, policy: &PollPolicy) -> Result<bool, ProbeError>
where
    F: FnMut() -> Result<bool, ProbeError>,
{
    Poller::new().poll_until(probe, policy)
}

/// Poll on the system clock, failing with a timeout error naming `condition`
pub fn wait_for<F>(condition: &str, probe: F, policy: &PollPolicy) -> PollResult<()>
where
    F: FnMut() -> Result<bool, ProbeError>,
{
    Poller::new().wait_for(condition, probe, policy)
}
