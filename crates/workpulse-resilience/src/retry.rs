// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry for provider rate-limit responses.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use workpulse_config::RateLimitConfig;
use workpulse_core::WorkpulseError;

/// Exponential backoff that honours a provider-supplied retry-after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Delay before retry number `retry` (1-based), capped at `max_delay`.
    pub fn delay_for(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)));
        retry_after.unwrap_or(backoff).min(self.max_delay)
    }

    /// Run `op`, retrying only on [`WorkpulseError::RateLimited`].
    ///
    /// Every other error is returned immediately. After `max_attempts`
    /// attempts the last rate-limit error is returned.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, WorkpulseError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, WorkpulseError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Err(WorkpulseError::RateLimited {
                    platform,
                    retry_after,
                }) if attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt, retry_after);
                    warn!(
                        %platform,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited by provider, backing off"
                    );
                    metrics::counter!("workpulse_send_retries_total", "platform" => platform.to_string())
                        .increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
