// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Global interval gate for history requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Spaces successive [`acquire`](RateLimiter::acquire) calls at least
/// `interval` apart, across every task sharing the limiter.
///
/// The lock is held across the sleep, so waiters are admitted one at a time
/// in lock order.
pub struct RateLimiter {
    interval: Duration,
    next_available: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_available: Mutex::new(Instant::now()),
        }
    }

    /// Waits until the next slot is free and claims it.
    pub async fn acquire(&self) {
        let mut next = self.next_available.lock().await;
        let now = Instant::now();
        if now < *next {
            let wait = *next - now;
            debug!(wait_ms = wait.as_millis() as u64, "rate limiter sleeping");
            tokio::time::sleep(wait).await;
        }
        *next = Instant::now() + self.interval;
    }
}
