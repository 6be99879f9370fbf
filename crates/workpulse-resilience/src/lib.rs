// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound send protection for platform adapters.
//!
//! [`OutboundGuard`] combines a per-recipient [`RecipientRateLimiter`] with a
//! [`RetryPolicy`] for provider rate-limit responses. Each attempt, retries
//! included, takes a limiter slot.

pub mod rate_limit;
pub mod retry;

use std::future::Future;
use std::time::Duration;

use workpulse_config::RateLimitConfig;
use workpulse_core::{Platform, WorkpulseError};

pub use rate_limit::RecipientRateLimiter;
pub use retry::RetryPolicy;

#[derive(Debug)]
pub struct OutboundGuard {
    limiter: RecipientRateLimiter,
    retry: RetryPolicy,
}

impl OutboundGuard {
    pub fn new(limiter: RecipientRateLimiter, retry: RetryPolicy) -> Self {
        Self { limiter, retry }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            RecipientRateLimiter::new(config.max_requests, Duration::from_secs(config.window_secs)),
            RetryPolicy::from_config(config),
        )
    }

    /// Run one logical send to `destination` under the limiter and retry policy.
    pub async fn send<T, F, Fut>(
        &self,
        platform: Platform,
        destination: &str,
        mut op: F,
    ) -> Result<T, WorkpulseError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, WorkpulseError>>,
    {
        let key = format!("{platform}:{destination}");
        self.retry
            .run(|| {
                let attempt = op();
                let key = &key;
                async move {
                    self.limiter.acquire(key).await;
                    attempt.await
                }
            })
            .await
    }

    pub fn limiter(&self) -> &RecipientRateLimiter {
        &self.limiter
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    fn guard() -> OutboundGuard {
        OutboundGuard::from_config(&RateLimitConfig {
            max_requests: 1,
            window_secs: 1,
            max_attempts: 3,
            base_backoff_ms: 100,
            max_backoff_ms: 1_000,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_sends_to_one_recipient_are_spaced() {
        let guard = guard();
        let start = Instant::now();
        for _ in 0..3 {
            guard
                .send(Platform::Telegram, "42", || async { Ok(()) })
                .await
                .unwrap();
        }
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn different_recipients_are_not_delayed() {
        let guard = guard();
        let start = Instant::now();
        for chat in ["1", "2", "3"] {
            guard
                .send(Platform::Telegram, chat, || async { Ok(()) })
                .await
                .unwrap();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_send_is_retried() {
        let guard = guard();
        let calls = AtomicU32::new(0);
        guard
            .send(Platform::Slack, "C1", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(WorkpulseError::RateLimited {
                        platform: Platform::Slack,
                        retry_after: Some(Duration::from_millis(200)),
                    })
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
