//! # Rate Limiting Module
//!
//! ## Purpose
//! Enforces spacing between outbound requests to the upstream decision
//! backend. The upstream enforces undocumented, variable rate limits, so each
//! slot is spaced by a delay drawn uniformly from a configured interval.
//!
//! ## Input/Output Specification
//! - **Input**: Configured [min_delay, max_delay] bounds
//! - **Output**: Timed grants; `acquire()` returns once enough time has passed
//! - **State**: One shared last-grant timestamp, monotonically non-decreasing
//!
//! ## Key Features
//! - Uniformly randomized per-call delay, independent of call outcome
//! - Single critical section guarding the read-then-write of the timestamp
//! - Pure timing logic, no I/O

use crate::config::RateLimitConfig;
use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Spaces outbound requests by a randomized delay.
///
/// One instance is shared by every upstream call in the process. The mutex is
/// held across the wait so that concurrent callers never observe a stale
/// last-grant timestamp.
pub struct RateLimiter {
    min_delay: Duration,
    max_delay: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given spacing bounds
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            last_grant: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.min_delay(), config.max_delay())
    }

    /// Wait until the randomized spacing since the previous grant has elapsed.
    ///
    /// Cannot fail; only waits. The first call is granted immediately. The
    /// last-grant timestamp is updated before returning, so every grant counts
    /// against the spacing regardless of what the caller does with it.
    pub async fn acquire(&self) {
        let mut last_grant = self.last_grant.lock().await;

        let delay = self.pick_delay();
        if let Some(previous) = *last_grant {
            let elapsed = previous.elapsed();
            if elapsed < delay {
                let wait = delay - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limiting upstream call");
                sleep(wait).await;
            }
        }

        *last_grant = Some(Instant::now());
    }

    fn pick_delay(&self) -> Duration {
        if self.min_delay >= self.max_delay {
            return self.min_delay;
        }
        rand::thread_rng().gen_range(self.min_delay..=self.max_delay)
    }
}
