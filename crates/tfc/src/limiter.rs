//! Sliding-window rate limiter for outbound requests

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::RateLimit;

/// Bounds how many requests start within any trailing window.
///
/// The limiter is local to the process; it does not coordinate with other
/// instances talking to the same API. Share one limiter (behind an `Arc`)
/// between every caller that should count against the same budget.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    permits: Mutex<VecDeque<Instant>>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from(RateLimit::default())
    }
}

impl From<RateLimit> for RateLimiter {
    fn from(limit: RateLimit) -> Self {
        Self::new(limit.max_requests, limit.window)
    }
}

impl RateLimiter {
    /// Allow `max_requests` permits per `window`. A zero budget is treated as one.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            permits: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Maximum permits per window.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Length of the window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until a request may start, then record it.
    ///
    /// The lock is held across the whole evict/check/wait decision so two
    /// callers can never both claim the last free slot. Dropping the future
    /// while it waits releases the lock and leaves the permit log untouched.
    pub async fn acquire(&self) {
        let mut permits = self.permits.lock().await;
        loop {
            let now = Instant::now();
            while let Some(&oldest) = permits.front() {
                if now.duration_since(oldest) >= self.window {
                    permits.pop_front();
                } else {
                    break;
                }
            }

            if permits.len() < self.max_requests {
                permits.push_back(now);
                return;
            }

            let Some(&oldest) = permits.front() else {
                continue;
            };
            let wait = self.window.saturating_sub(now.duration_since(oldest));
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of permits recorded inside the current window.
    pub async fn in_flight(&self) -> usize {
        let permits = self.permits.lock().await;
        let now = Instant::now();
        permits
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count()
    }
}
