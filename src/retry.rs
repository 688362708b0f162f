//! # Retry Module
//!
//! ## Purpose
//! Wraps upstream operations with exponential-backoff retries. Transient
//! failures (rate limiting, connectivity blips) are expected from the
//! upstream backend and usually resolve after waiting.
//!
//! ## Input/Output Specification
//! - **Input**: Any fallible async upstream operation
//! - **Output**: The operation's result, or `RetriesExhausted` wrapping the
//!   last transient failure once the attempt budget runs out
//! - **Policy**: Only transient failures are retried; everything else
//!   propagates immediately
//!
//! ## Key Features
//! - Exponential backoff doubling per attempt, capped at a ceiling
//! - Attempt accounting independent of any concurrency primitive
//! - Every attempt still passes through the shared rate limiter, because the
//!   spacing is applied inside the upstream client itself

use crate::config::RetryConfig;
use crate::errors::{Result, SearchError};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Executes upstream operations with a fixed attempt budget and exponential
/// backoff between transient failures.
#[derive(Debug, Clone)]
pub struct RetryingExecutor {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryingExecutor {
    /// Create an executor with an explicit policy.
    ///
    /// `max_attempts` counts the first call, so a value of 4 allows up to
    /// three retries. `initial_backoff` should start at the rate limiter's
    /// maximum delay so retries never undercut the normal request spacing.
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.initial_backoff(),
            config.max_backoff(),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `operation`, retrying transient failures with exponential backoff.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = self.initial_backoff;
        let mut last_error: Option<SearchError> = None;

        for attempt in 1..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    warn!(
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        category = err.category(),
                        error = %err,
                        "Transient upstream failure"
                    );
                    last_error = Some(err);

                    if attempt < self.max_attempts {
                        sleep(backoff).await;
                        backoff = (backoff * 2).min(self.max_backoff);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Err(SearchError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempts were made".to_string()),
        })
    }
}
