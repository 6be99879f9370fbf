// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use workpulse_core::{
    CommandHandler, CommandReply, NormalizedUpdate, Platform, PlatformRegistry, ReportFormatter,
    StructuredReport,
};
use workpulse_gateway::{GatewayState, HealthState, build_router};
use workpulse_test_utils::MockAdapter;
use workpulse_test_utils::mock_adapter::{MOCK_AUTH_HEADER, MOCK_AUTH_VALUE};

struct NullFormatter;

impl ReportFormatter for NullFormatter {
    fn format(&self, _report: &StructuredReport) -> Vec<String> {
        vec![String::new()]
    }
}

#[derive(Default)]
struct EchoHandler {
    seen: Mutex<Vec<NormalizedUpdate>>,
}

#[async_trait]
impl CommandHandler for EchoHandler {
    async fn handle(&self, update: NormalizedUpdate) -> CommandReply {
        let reply = format!("{} from {}", update.action, update.user_id);
        self.seen.lock().unwrap().push(update);
        CommandReply::new(reply)
    }
}

fn state(handler: Arc<EchoHandler>) -> GatewayState {
    let mut registry = PlatformRegistry::new();
    registry.register(
        Arc::new(MockAdapter::new(Platform::Telegram)),
        Arc::new(NullFormatter),
    );
    GatewayState {
        registry: Arc::new(registry),
        commands: handler,
        health: HealthState::new(),
    }
}

fn webhook(path: &str, authenticated: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json");
    if authenticated {
        builder = builder.header(MOCK_AUTH_HEADER, MOCK_AUTH_VALUE);
    }
    builder
        .body(Body::from(r#"{"user_id":"u1","chat_id":"c1","text":"status"}"#))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn authenticated_webhook_reaches_command_handler() {
    let handler = Arc::new(EchoHandler::default());
    let app = build_router(state(handler.clone()));

    let response = app.oneshot(webhook("/webhooks/telegram", true)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "status from u1");

    let seen = handler.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].platform, Platform::Telegram);
    assert_eq!(seen[0].chat_id, "c1");
}

#[tokio::test]
async fn unauthenticated_webhook_is_401_and_not_handled() {
    let handler = Arc::new(EchoHandler::default());
    let app = build_router(state(handler.clone()));

    let response = app.oneshot(webhook("/webhooks/telegram", false)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(handler.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_platform_is_404() {
    let app = build_router(state(Arc::new(EchoHandler::default())));
    let response = app.oneshot(webhook("/webhooks/discord", true)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unconfigured_platform_is_404() {
    let app = build_router(state(Arc::new(EchoHandler::default())));
    let response = app.oneshot(webhook("/webhooks/slack", true)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "not found");
}

#[tokio::test]
async fn webhooks_require_post() {
    let app = build_router(state(Arc::new(EchoHandler::default())));
    let request = Request::builder()
        .uri("/webhooks/telegram")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn health_reports_adapters_and_uptime() {
    let app = build_router(state(Arc::new(EchoHandler::default())));
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["platforms"]["telegram"], "healthy");
    assert!(json["uptime_secs"].is_u64());
}

#[tokio::test]
async fn metrics_are_404_without_a_recorder() {
    let app = build_router(state(Arc::new(EchoHandler::default())));
    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_serve_the_rendered_exposition() {
    let mut state = state(Arc::new(EchoHandler::default()));
    state.health = HealthState::new().with_metrics(Arc::new(|| {
        "# TYPE workpulse_fanout_runs_total counter\nworkpulse_fanout_runs_total 3\n".to_string()
    }));
    let app = build_router(state);
    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"), "{content_type}");
    assert!(body_string(response).await.contains("workpulse_fanout_runs_total 3"));
}
