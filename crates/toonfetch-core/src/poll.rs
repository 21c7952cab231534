//! Bounded polling for late-bound page state
//!
//! Video players compute their source asynchronously after page load, so
//! the resolver checks repeatedly until a value shows up or the budget runs
//! out. `Poller` is that loop, shared by every resolution strategy.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

/// Fixed-interval retry loop with an attempt cap and/or a time cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    interval: Duration,
    max_attempts: Option<u32>,
    max_elapsed: Option<Duration>,
}

impl Poller {
    /// Poll at most `max_attempts` times, `interval` apart.
    pub fn attempts(max_attempts: u32, interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
            max_elapsed: None,
        }
    }

    /// Poll every `interval` until `max_elapsed` has passed.
    pub fn deadline(max_elapsed: Duration, interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            max_elapsed: Some(max_elapsed),
        }
    }

    /// Run `check` until it yields a value or the budget is exhausted.
    ///
    /// The first check runs immediately. No sleep follows the final attempt,
    /// and a sleep is shortened so it never overshoots the deadline.
    pub async fn poll<T, F, Fut>(&self, mut check: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let start = Instant::now();
        let deadline = self.max_elapsed.map(|d| start + d);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            if let Some(value) = check().await {
                debug!(attempt, "poll satisfied");
                return Some(value);
            }

            if self.max_attempts.is_some_and(|max| attempt >= max) {
                debug!(attempt, "poll attempts exhausted");
                return None;
            }

            let mut pause = self.interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    debug!(attempt, "poll deadline reached");
                    return None;
                }
                pause = pause.min(deadline - now);
            }
            sleep(pause).await;
        }
    }
}
