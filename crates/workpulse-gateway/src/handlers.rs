// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for `/health`, `/metrics` and `/webhooks/{platform}`.

use std::collections::BTreeMap;
use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};
use workpulse_core::{HealthStatus, Platform, WebhookRequest, WebhookResponse};

use crate::server::GatewayState;

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when every adapter is healthy, otherwise `degraded`.
    pub status: &'static str,
    pub uptime_secs: u64,
    pub platforms: BTreeMap<Platform, String>,
}

pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let platforms = state.registry.platforms();
    let checks = join_all(platforms.iter().map(|&platform| {
        let adapter = state.registry.adapter(platform);
        async move {
            let status = match adapter {
                Some(adapter) => match adapter.health_check().await {
                    Ok(HealthStatus::Healthy) => "healthy".to_string(),
                    Ok(HealthStatus::Degraded(reason)) => format!("degraded: {reason}"),
                    Ok(HealthStatus::Unhealthy(reason)) => format!("unhealthy: {reason}"),
                    Err(e) => format!("unhealthy: {e}"),
                },
                None => "unregistered".to_string(),
            };
            (platform, status)
        }
    }))
    .await;

    let all_healthy = checks.iter().all(|(_, s)| s == "healthy");
    Json(HealthResponse {
        status: if all_healthy { "ok" } else { "degraded" },
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        platforms: checks.into_iter().collect(),
    })
}

/// Prometheus text exposition, unauthenticated like `/health`.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.metrics_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn post_webhook(
    State(state): State<GatewayState>,
    Path(platform): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Ok(platform) = platform.parse::<Platform>() else {
        debug!(%platform, "webhook for unknown platform");
        return StatusCode::NOT_FOUND.into_response();
    };
    let adapter = match state.registry.require(platform) {
        Ok(registered) => registered.adapter.clone(),
        Err(e) => {
            debug!(error = %e, "webhook for unconfigured platform");
            return into_response(WebhookResponse::from_error(&e));
        }
    };

    let request = to_webhook_request(&headers, body);
    let response = adapter
        .handle_webhook(&request, state.commands.as_ref())
        .await;
    if response.status == 401 {
        warn!(%platform, "webhook authentication failed");
    }
    into_response(response)
}

/// Header names from `http` are already lowercase.
fn to_webhook_request(headers: &HeaderMap, body: Bytes) -> WebhookRequest {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    WebhookRequest {
        headers,
        body: body.to_vec(),
    }
}

fn into_response(response: WebhookResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}
