// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus recorder for the counters emitted by the scheduler and the
//! outbound guard. Rendered by the gateway at `GET /metrics`.

use std::sync::Arc;

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use workpulse_core::WorkpulseError;

/// Installs the process-wide recorder. Only one recorder may exist per process.
pub fn install_recorder() -> Result<PrometheusHandle, WorkpulseError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        WorkpulseError::Internal(format!("failed to install Prometheus recorder: {e}"))
    })?;
    register_metrics();
    tracing::info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Describe every counter workpulse emits.
pub fn register_metrics() {
    describe_counter!(
        "workpulse_fanout_runs_total",
        "Completed fan-out passes"
    );
    describe_counter!(
        "workpulse_fanout_subscribers_total",
        "Subscribers processed by fan-out, labelled by outcome"
    );
    describe_counter!(
        "workpulse_fanout_skipped_total",
        "Scheduled fan-out triggers skipped because a pass was still running"
    );
    describe_counter!(
        "workpulse_deliveries_total",
        "Platform deliveries, labelled sent or failed"
    );
    describe_counter!(
        "workpulse_send_retries_total",
        "Outbound sends retried after a transient platform error"
    );
    describe_counter!(
        "workpulse_rate_limiter_waits_total",
        "Outbound sends delayed by the per-recipient rate limiter"
    );
}

/// Boxed render function for `HealthState::with_metrics`.
pub fn render_fn(handle: PrometheusHandle) -> Arc<dyn Fn() -> String + Send + Sync> {
    Arc::new(move || handle.render())
}
