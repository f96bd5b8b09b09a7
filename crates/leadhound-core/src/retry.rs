// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry with server-directed or exponential delays.
//!
//! Used by the history crawler for rate-limit handling and by HTTP adapters
//! for transient upstream failures. Delays go through `tokio::time::sleep`,
//! so tests may run against a paused clock.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt when backing off.
    pub base_delay: Duration,
    /// Ceiling for any computed backoff delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Exponential delay after the given failed attempt (1-based), capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after exactly this delay (e.g. a server-provided retry-after).
    RetryAfter(Duration),
    /// Retry after the policy's exponential backoff delay.
    Backoff,
    /// Stop immediately; the error is not retryable.
    Abort,
}

/// Terminal failure of [`retry_with_backoff`].
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every allowed attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with an error classified as non-retryable.
    #[error("{0}")]
    Aborted(E),
}

/// Runs `op` until it succeeds, `decide` aborts, or the policy is exhausted.
pub async fn retry_with_backoff<T, E, F, Fut, D>(
    policy: RetryPolicy,
    mut op: F,
    decide: D,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: Fn(&E) -> RetryDecision,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let delay = match decide(&err) {
            RetryDecision::Abort => return Err(RetryError::Aborted(err)),
            RetryDecision::RetryAfter(d) => d,
            RetryDecision::Backoff => policy.backoff_delay(attempt),
        };

        if attempt >= max_attempts {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(100), Duration::from_secs(1))
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = policy(5);
        assert_eq!(p.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(p.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(p.backoff_delay(3), Duration::from_millis(400));
        assert_eq!(p.backoff_delay(10), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, RetryError<String>> = retry_with_backoff(
            policy(3),
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("fail {n}")) } else { Ok(n) }
            },
            |_| RetryDecision::Backoff,
        )
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), RetryError<&str>> = retry_with_backoff(
            policy(4),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("slow down")
            },
            |_| RetryDecision::RetryAfter(Duration::from_secs(2)),
        )
        .await;
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert_eq!(last, "slow down");
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_stops_immediately() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), RetryError<&str>> = retry_with_backoff(
            policy(5),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("forbidden")
            },
            |_| RetryDecision::Abort,
        )
        .await;
        assert!(matches!(result, Err(RetryError::Aborted("forbidden"))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn honors_server_delay() {
        let start = tokio::time::Instant::now();
        let calls = &AtomicU32::new(0);
        let _: Result<(), RetryError<&str>> = retry_with_backoff(
            policy(2),
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("429")
                } else {
                    Ok(())
                }
            },
            |_| RetryDecision::RetryAfter(Duration::from_secs(6)),
        )
        .await;
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), RetryError<&str>> = retry_with_backoff(
            policy(0),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            },
            |_| RetryDecision::Backoff,
        )
        .await;
        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
