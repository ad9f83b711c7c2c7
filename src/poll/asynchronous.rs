//! Async poller for probes that talk to a driver over an async client.
//!
//! Same contract as the blocking poller, suspending on `tokio::time::sleep`
//! between evaluations. An evaluation that starts before the deadline but
//! finishes after it is followed by one more, immediately.

use std::future::Future;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use super::types::{PollOutcome, PollPolicy, ProbeError};

/// Poll an async probe, returning attempt count and elapsed time
pub async fn poll_async<F, Fut>(mut probe: F, policy: &PollPolicy) -> Result<PollOutcome, ProbeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ProbeError>>,
{
    let start = Instant::now();
    if !policy.initial_delay.is_zero() {
        sleep(policy.initial_delay).await;
    }

    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let started = start.elapsed();
        let satisfied = match probe().await {
            Ok(value) => value,
            Err(err) if policy.tolerates(&err) => false,
            Err(err) => return Err(err),
        };

        let elapsed = start.elapsed();
        if !satisfied && elapsed >= policy.timeout && started < policy.timeout {
            trace!(attempt = attempts, "deadline passed during evaluation, evaluating once more");
            continue;
        }
        if satisfied || elapsed >= policy.timeout {
            debug!(satisfied, attempts, elapsed_ms = elapsed.as_millis() as u64, "async poll finished");
            return Ok(PollOutcome {
                satisfied,
                attempts,
                elapsed,
            });
        }

        sleep(policy.interval).await;
    }
}

/// Poll an async probe until it returns `true` or `policy` times out
pub async fn poll_until_async<F, Fut>(probe: F, policy: &PollPolicy) -> Result<bool, ProbeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ProbeError>>,
{
    poll_async(probe, policy).await.map(|outcome| outcome.satisfied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn succeeds_immediately() {
        let policy = PollPolicy::new(Duration::from_secs(5), Duration::from_millis(500));
        let outcome = poll_async(|| async { Ok(true) }, &policy).await.unwrap();
        assert!(outcome.satisfied);
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.elapsed < Duration::from_millis(250));
    }

    #[tokio::test]
    async fn succeeds_after_transient_errors() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = PollPolicy::new(Duration::from_secs(5), Duration::from_millis(10));

        let probe_counter = counter.clone();
        let satisfied = poll_until_async(
            move || {
                let c = probe_counter.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ProbeError::transient("not attached yet"))
                    } else {
                        Ok(true)
                    }
                }
            },
            &policy,
        )
        .await
        .unwrap();

        assert!(satisfied);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out() {
        let policy = PollPolicy::new(Duration::from_millis(60), Duration::from_millis(20));
        let outcome = poll_async(|| async { Ok(false) }, &policy).await.unwrap();
        assert!(!outcome.satisfied);
        assert!(outcome.elapsed >= policy.timeout);
    }

    #[tokio::test]
    async fn fatal_error_propagates() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = PollPolicy::new(Duration::from_secs(5), Duration::from_millis(10));

        let probe_counter = counter.clone();
        let result = poll_until_async(
            move || {
                probe_counter.fetch_add(1, Ordering::SeqCst);
                async { Err(ProbeError::fatal("invalid selector")) }
            },
            &policy,
        )
        .await;

        assert_eq!(result, Err(ProbeError::fatal("invalid selector")));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tolerate_all_swallows_fatal_errors() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = PollPolicy::new(Duration::from_secs(5), Duration::from_millis(10)).tolerate_all_errors(true);

        let probe_counter = counter.clone();
        let satisfied = poll_until_async(
            move || {
                let c = probe_counter.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ProbeError::fatal("stale element"))
                    } else {
                        Ok(true)
                    }
                }
            },
            &policy,
        )
        .await
        .unwrap();

        assert!(satisfied);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn initial_delay_precedes_first_evaluation() {
        let policy = PollPolicy::new(Duration::from_secs(5), Duration::from_millis(10))
            .initial_delay(Duration::from_millis(40));
        let outcome = poll_async(|| async { Ok(true) }, &policy).await.unwrap();
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.elapsed >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn timeout_is_bounded_by_one_interval() {
        let policy = PollPolicy::new(Duration::from_millis(100), Duration::from_millis(40));
        let outcome = poll_async(|| async { Ok(false) }, &policy).await.unwrap();
        assert!(!outcome.satisfied);
        assert!(outcome.elapsed >= policy.timeout);
        assert!(outcome.elapsed < policy.timeout + policy.interval + Duration::from_millis(200));
    }

    #[tokio::test]
    async fn last_chance_evaluation_starts_after_deadline() {
        let policy = PollPolicy::new(Duration::from_millis(100), Duration::from_millis(50));
        let origin = Instant::now();
        let starts = Arc::new(std::sync::Mutex::new(Vec::new()));

        let recorded = starts.clone();
        let outcome = poll_async(
            move || {
                let recorded = recorded.clone();
                async move {
                    recorded.lock().unwrap().push(origin.elapsed());
                    sleep(Duration::from_millis(30)).await;
                    Ok(false)
                }
            },
            &policy,
        )
        .await
        .unwrap();

        assert!(!outcome.satisfied);
        let starts = starts.lock().unwrap();
        assert_eq!(starts.len() as u32, outcome.attempts);
        assert!(*starts.last().unwrap() >= policy.timeout);
    }
}
