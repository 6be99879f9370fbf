// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron trigger with a run-level overlap guard.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use croner::Cron;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use workpulse_config::ScheduleConfig;
use workpulse_core::WorkpulseError;

use crate::job::{FanOutJob, RunSummary};

/// Fires the fan-out job on a cron schedule, evaluated in local time.
pub struct Scheduler {
    job: Arc<FanOutJob>,
    cron: Cron,
    expression: String,
    running: Mutex<()>,
}

impl Scheduler {
    pub fn new(job: Arc<FanOutJob>, config: &ScheduleConfig) -> Result<Self, WorkpulseError> {
        let expression = config.cron_expression();
        let cron = expression.parse::<Cron>().map_err(|e| {
            WorkpulseError::Config(format!("invalid schedule `{expression}`: {e}"))
        })?;
        Ok(Self {
            job,
            cron,
            expression,
            running: Mutex::new(()),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The first trigger strictly after `after`.
    pub fn next_run_after(&self, after: &DateTime<Local>) -> Result<DateTime<Local>, WorkpulseError> {
        self.cron
            .find_next_occurrence(after, false)
            .map_err(|e| WorkpulseError::Internal(format!("no next occurrence for `{}`: {e}", self.expression)))
    }

    /// The next trigger after `now`, but never at or before `previous`.
    ///
    /// A timer that wakes early, or a wall clock stepped back after a run,
    /// would otherwise find the occurrence that just fired again.
    pub fn next_run_following(
        &self,
        now: &DateTime<Local>,
        previous: Option<&DateTime<Local>>,
    ) -> Result<DateTime<Local>, WorkpulseError> {
        let anchor = match previous {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        self.next_run_after(anchor)
    }

    /// Run the job unless a run is already in progress.
    ///
    /// Returns `None` when skipped because of an overlapping run.
    pub async fn run_guarded(&self) -> Option<Result<RunSummary, WorkpulseError>> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("previous fan-out run still in progress, skipping this trigger");
            metrics::counter!("workpulse_fanout_skipped_total").increment(1);
            return None;
        };
        Some(self.job.run().await)
    }

    /// Wait for each trigger and start a run, until `cancel` fires.
    ///
    /// Cancellation only stops the waiting; an in-flight run is awaited.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(schedule = %self.expression, "scheduler started");
        let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
        let mut previous: Option<DateTime<Local>> = None;

        loop {
            let now = Local::now();
            let next = match self.next_run_following(&now, previous.as_ref()) {
                Ok(next) => next,
                Err(e) => {
                    error!(error = %e, "cannot compute next trigger, scheduler stopping");
                    break;
                }
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(next_run = %next.to_rfc3339(), "next fan-out run scheduled");

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
            previous = Some(next);

            in_flight.retain(|handle| !handle.is_finished());
            let this = Arc::clone(&self);
            in_flight.push(tokio::spawn(async move {
                match this.run_guarded().await {
                    Some(Ok(_)) | None => {}
                    Some(Err(e)) => error!(error = %e, "fan-out run aborted"),
                }
            }));
        }

        in_flight.retain(|handle| !handle.is_finished());
        if !in_flight.is_empty() {
            info!("waiting for in-flight fan-out run to finish");
        }
        for handle in in_flight {
            if let Err(e) = handle.await {
                error!(error = %e, "fan-out task panicked");
            }
        }
        info!("scheduler stopped");
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("expression", &self.expression)
            .finish_non_exhaustive()
    }
}
