// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The batched fan-out run.
//!
//! Subscribers are processed in batches of `schedule.batch_size`: batches run
//! one after another, subscribers inside a batch run concurrently. A failure
//! for one subscriber or one platform never affects the others. Only a
//! failure to list subscribers aborts the run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};
use workpulse_config::{LastSentPolicy, ScheduleConfig};
use workpulse_core::{
    PlatformRegistry, ReportGenerator, Subscriber, SubscriberStore, WorkpulseError, deliver,
};

/// Aggregate result of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Subscribers whose report was generated and processed.
    pub success: usize,
    /// Subscribers with no stored work entry.
    pub no_messages: usize,
    /// Subscribers whose generation or bookkeeping failed.
    pub errors: usize,
    pub deliveries_sent: usize,
    pub deliveries_failed: usize,
    /// Enabled platforms skipped for lack of a destination or adapter.
    pub platforms_skipped: usize,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.success + self.no_messages + self.errors
    }

    fn record(&mut self, outcome: &SubscriberOutcome) {
        match outcome.kind {
            OutcomeKind::Success => self.success += 1,
            OutcomeKind::NoMessages => self.no_messages += 1,
            OutcomeKind::Error => self.errors += 1,
        }
        self.deliveries_sent += outcome.sent;
        self.deliveries_failed += outcome.failed;
        self.platforms_skipped += outcome.skipped;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutcomeKind {
    Success,
    NoMessages,
    Error,
}

impl OutcomeKind {
    fn label(self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::NoMessages => "no_messages",
            OutcomeKind::Error => "error",
        }
    }
}

#[derive(Debug)]
struct SubscriberOutcome {
    kind: OutcomeKind,
    sent: usize,
    failed: usize,
    skipped: usize,
}

impl SubscriberOutcome {
    fn of(kind: OutcomeKind) -> Self {
        Self {
            kind,
            sent: 0,
            failed: 0,
            skipped: 0,
        }
    }
}

pub struct FanOutJob {
    store: Arc<dyn SubscriberStore>,
    registry: Arc<PlatformRegistry>,
    generator: Arc<dyn ReportGenerator>,
    batch_size: usize,
    verbose: bool,
    last_sent_policy: LastSentPolicy,
}

impl FanOutJob {
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        registry: Arc<PlatformRegistry>,
        generator: Arc<dyn ReportGenerator>,
        config: &ScheduleConfig,
    ) -> Self {
        Self {
            store,
            registry,
            generator,
            batch_size: config.batch_size.max(1),
            verbose: config.verbose,
            last_sent_policy: config.last_sent_policy,
        }
    }

    /// Run once over every active subscriber.
    pub async fn run(&self) -> Result<RunSummary, WorkpulseError> {
        let started = Instant::now();
        let subscribers = self.store.list_active_subscribers().await?;
        info!(
            subscribers = subscribers.len(),
            batch_size = self.batch_size,
            "starting fan-out run"
        );

        let mut summary = RunSummary::default();
        for (index, batch) in subscribers.chunks(self.batch_size).enumerate() {
            debug!(batch = index + 1, size = batch.len(), "processing batch");
            let outcomes = join_all(batch.iter().map(|s| self.process(s))).await;
            for outcome in &outcomes {
                metrics::counter!("workpulse_fanout_subscribers_total", "outcome" => outcome.kind.label())
                    .increment(1);
                summary.record(outcome);
            }
        }

        metrics::counter!("workpulse_fanout_runs_total").increment(1);
        metrics::counter!("workpulse_deliveries_total", "result" => "sent")
            .increment(summary.deliveries_sent as u64);
        metrics::counter!("workpulse_deliveries_total", "result" => "failed")
            .increment(summary.deliveries_failed as u64);
        info!(
            success = summary.success,
            no_messages = summary.no_messages,
            errors = summary.errors,
            deliveries_sent = summary.deliveries_sent,
            deliveries_failed = summary.deliveries_failed,
            platforms_skipped = summary.platforms_skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fan-out run complete"
        );
        Ok(summary)
    }

    async fn process(&self, subscriber: &Subscriber) -> SubscriberOutcome {
        let id = subscriber.id.as_str();

        let entry = match self.store.latest_entry_for_owner(id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(subscriber_id = id, "no work entries, skipping");
                return SubscriberOutcome::of(OutcomeKind::NoMessages);
            }
            Err(e) => {
                warn!(subscriber_id = id, error = %e, "failed to read latest work entry");
                return SubscriberOutcome::of(OutcomeKind::Error);
            }
        };

        let report = match self.generator.generate(&entry.content, self.verbose).await {
            Ok(report) => report,
            Err(e) => {
                warn!(subscriber_id = id, entry_id = %entry.id, error = %e, "report generation failed");
                return SubscriberOutcome::of(OutcomeKind::Error);
            }
        };

        let mut outcome = SubscriberOutcome::of(OutcomeKind::Success);
        for &platform in &subscriber.enabled {
            let Some(destination) = subscriber.destination(platform) else {
                warn!(subscriber_id = id, %platform, "platform enabled without a chat id, skipping");
                outcome.skipped += 1;
                continue;
            };
            let registered = match self.registry.require(platform) {
                Ok(registered) => registered,
                Err(e) => {
                    warn!(subscriber_id = id, error = %e, "skipping platform");
                    outcome.skipped += 1;
                    continue;
                }
            };

            let chunks = registered.formatter.format(&report);
            let options = registered.formatter.send_options();
            match deliver(
                registered.adapter.as_ref(),
                self.store.as_ref(),
                id,
                destination,
                &chunks,
                &options,
            )
            .await
            {
                Ok(count) => {
                    debug!(subscriber_id = id, %platform, chunks = count, "summary delivered");
                    outcome.sent += 1;
                }
                Err(e) => {
                    warn!(subscriber_id = id, %platform, error = %e, "summary delivery failed");
                    outcome.failed += 1;
                }
            }
        }

        let stamp = match self.last_sent_policy {
            LastSentPolicy::OnAttempt => true,
            LastSentPolicy::OnDelivery => outcome.sent > 0,
        };
        if stamp && let Err(e) = self.store.update_last_sent(id, Utc::now()).await {
            warn!(subscriber_id = id, error = %e, "failed to update last sent time");
            outcome.kind = OutcomeKind::Error;
        }
        outcome
    }
}

impl std::fmt::Debug for FanOutJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutJob")
            .field("registry", &self.registry)
            .field("batch_size", &self.batch_size)
            .field("verbose", &self.verbose)
            .field("last_sent_policy", &self.last_sent_policy)
            .finish_non_exhaustive()
    }
}
