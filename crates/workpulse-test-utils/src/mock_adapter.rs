// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock platform adapter for deterministic testing.
//!
//! `MockAdapter` captures every outbound message and can be told to treat a
//! destination as blocked or failing. Inbound webhooks are JSON
//! `{"user_id", "chat_id", "text"}` bodies authenticated by a fixed header.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use workpulse_core::command::parse_command;
use workpulse_core::{
    CommandHandler, HealthStatus, NormalizedUpdate, Platform, PlatformAdapter, SendOptions,
    WebhookRequest, WebhookResponse, WorkpulseError,
};

/// Header the mock adapter requires on inbound requests.
pub const MOCK_AUTH_HEADER: &str = "x-mock-signature";
/// The only value of [`MOCK_AUTH_HEADER`] that passes validation.
pub const MOCK_AUTH_VALUE: &str = "valid";

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: String,
    pub content: String,
    pub options: SendOptions,
}

#[derive(Debug, Deserialize)]
struct MockPayload {
    user_id: String,
    chat_id: String,
    text: String,
}

pub struct MockAdapter {
    platform: Platform,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    blocked: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    attempts: AtomicUsize,
}

impl MockAdapter {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            sent: Arc::new(Mutex::new(Vec::new())),
            blocked: Mutex::new(HashSet::new()),
            failing: Mutex::new(HashSet::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Sends to `destination` fail with `RecipientBlocked` from now on.
    pub async fn block(&self, destination: &str) {
        self.blocked.lock().await.insert(destination.to_string());
    }

    /// Sends to `destination` fail with a generic dispatch error from now on.
    pub async fn fail(&self, destination: &str) {
        self.failing.lock().await.insert(destination.to_string());
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, destination: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.destination == destination)
            .map(|m| m.content.clone())
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Send attempts, including those that failed.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn send_message(
        &self,
        destination: &str,
        content: &str,
        options: &SendOptions,
    ) -> Result<(), WorkpulseError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.blocked.lock().await.contains(destination) {
            return Err(WorkpulseError::RecipientBlocked {
                platform: self.platform,
                destination: destination.to_string(),
            });
        }
        if self.failing.lock().await.contains(destination) {
            return Err(WorkpulseError::dispatch(self.platform, "mock send failure"));
        }
        self.sent.lock().await.push(SentMessage {
            destination: destination.to_string(),
            content: content.to_string(),
            options: *options,
        });
        Ok(())
    }

    fn validate_webhook(&self, request: &WebhookRequest) -> bool {
        request.header(MOCK_AUTH_HEADER) == Some(MOCK_AUTH_VALUE)
    }

    fn parse_update(
        &self,
        request: &WebhookRequest,
    ) -> Result<Option<NormalizedUpdate>, WorkpulseError> {
        let payload: MockPayload = serde_json::from_slice(&request.body)
            .map_err(|e| WorkpulseError::Validation(format!("malformed mock payload: {e}")))?;
        let (action, data) = parse_command(&payload.text);
        Ok(Some(NormalizedUpdate {
            platform: self.platform,
            user_id: payload.user_id,
            chat_id: payload.chat_id,
            action,
            data,
        }))
    }

    async fn handle_webhook(
        &self,
        request: &WebhookRequest,
        commands: &dyn CommandHandler,
    ) -> WebhookResponse {
        if !self.validate_webhook(request) {
            return WebhookResponse::unauthorized();
        }
        match self.parse_update(request) {
            Ok(Some(update)) => {
                let reply = commands.handle(update).await;
                WebhookResponse::text(200, reply.text)
            }
            Ok(None) => WebhookResponse::ok(),
            Err(e) => WebhookResponse::bad_request(e.to_string()),
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, WorkpulseError> {
        Ok(HealthStatus::Healthy)
    }
}
