// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window rate limiter keyed by recipient.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// At most `max_requests` admissions per key within any `window`.
///
/// Keys are independent: a busy recipient never delays another one.
/// Idle keys are swept at most once per window, so the map only holds
/// recipients sent to within the last two windows.
#[derive(Debug)]
pub struct RecipientRateLimiter {
    max_requests: usize,
    window: Duration,
    windows: DashMap<String, VecDeque<Instant>>,
    last_prune: Mutex<Instant>,
}

impl RecipientRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1) as usize,
            window,
            windows: DashMap::new(),
            last_prune: Mutex::new(Instant::now()),
        }
    }

    /// Admit immediately, or return how long until a slot frees up.
    pub fn try_acquire(&self, key: &str) -> Result<(), Duration> {
        let now = Instant::now();
        // Must run before `entry` below: `retain` locks every shard.
        self.maybe_prune(now);
        let mut slots = self.windows.entry(key.to_string()).or_default();
        while let Some(&oldest) = slots.front() {
            if now.duration_since(oldest) >= self.window {
                slots.pop_front();
            } else {
                break;
            }
        }
        if slots.len() < self.max_requests {
            slots.push_back(now);
            return Ok(());
        }
        let oldest = slots.front().copied().unwrap_or(now);
        Err((oldest + self.window).saturating_duration_since(now))
    }

    /// Wait until `key` may send, then record the send.
    pub async fn acquire(&self, key: &str) {
        loop {
            // The map guard is released before sleeping.
            let wait = match self.try_acquire(key) {
                Ok(()) => return,
                Err(wait) => wait,
            };
            tracing::debug!(key, wait_ms = wait.as_millis() as u64, "recipient rate limited locally");
            metrics::counter!("workpulse_rate_limiter_waits_total").increment(1);
            tokio::time::sleep(wait).await;
        }
    }

    /// Sweep idle keys if a full window has passed since the last sweep.
    /// Skipped when another caller is already sweeping.
    fn maybe_prune(&self, now: Instant) {
        let Ok(mut last) = self.last_prune.try_lock() else {
            return;
        };
        if now.duration_since(*last) < self.window {
            return;
        }
        *last = now;
        drop(last);

        let before = self.windows.len();
        self.prune_at(now);
        tracing::trace!(before, after = self.windows.len(), "pruned idle rate-limit keys");
    }

    /// Drop keys whose windows have fully expired.
    pub fn prune_idle(&self) {
        self.prune_at(Instant::now());
    }

    fn prune_at(&self, now: Instant) {
        self.windows.retain(|_, slots| {
            slots
                .back()
                .is_some_and(|last| now.duration_since(*last) < self.window)
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}
