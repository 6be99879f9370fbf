// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack adapter for Workpulse.
//!
//! Inbound traffic arrives as `/workpulse` slash commands or Events API
//! direct messages, both signed with the app's signing secret. Outbound
//! messages go through `chat.postMessage` to the user's app DM.

pub mod format;
pub mod payload;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};
use workpulse_config::SlackConfig;
use workpulse_core::command::parse_command;
use workpulse_core::{
    Action, CommandHandler, HealthStatus, NormalizedUpdate, Platform, PlatformAdapter,
    SendOptions, WebhookRequest, WebhookResponse, WorkpulseError,
};
use workpulse_resilience::OutboundGuard;
use workpulse_security::SignedRequestVerifier;

pub use format::SlackFormatter;

use crate::payload::{ApiResponse, EventEnvelope, SlashCommand};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_NUM_HEADER: &str = "x-slack-retry-num";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Slack error codes meaning the recipient can no longer be reached.
const BLOCKED_ERRORS: &[&str] = &["account_inactive", "not_in_channel", "is_archived"];

/// What a verified request turned out to be.
enum Inbound {
    Slash(NormalizedUpdate),
    Event(NormalizedUpdate),
    Challenge(String),
    Ignored,
}

pub struct SlackAdapter {
    client: reqwest::Client,
    api_base_url: String,
    bot_token: String,
    verifier: SignedRequestVerifier,
    guard: Arc<OutboundGuard>,
}

impl SlackAdapter {
    /// Requires `slack.bot_token` and `slack.signing_secret`.
    pub fn new(config: &SlackConfig, guard: Arc<OutboundGuard>) -> Result<Self, WorkpulseError> {
        let bot_token = config
            .bot_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WorkpulseError::Config("slack.bot_token is required".into()))?;
        if config.signing_secret.as_deref().is_none_or(str::is_empty) {
            return Err(WorkpulseError::Config(
                "slack.signing_secret is required when Slack is enabled".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WorkpulseError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token,
            verifier: SignedRequestVerifier::slack(config.signing_secret.clone()),
            guard,
        })
    }

    fn authenticate(&self, request: &WebhookRequest) -> Result<(), WorkpulseError> {
        self.verifier
            .verify_request(request, chrono::Utc::now().timestamp())
            .map_err(|rejection| {
                warn!(%rejection, "rejected Slack webhook");
                rejection.into_error(Platform::Slack)
            })
    }

    fn classify(&self, request: &WebhookRequest) -> Result<Inbound, WorkpulseError> {
        if request.content_type() == Some(FORM_CONTENT_TYPE) {
            let cmd: SlashCommand = serde_urlencoded::from_bytes(&request.body).map_err(|e| {
                WorkpulseError::Validation(format!("malformed slash command: {e}"))
            })?;
            debug!(command = %cmd.command, user = %cmd.user_id, "slash command received");
            let (action, data) = if cmd.text.trim().is_empty() {
                (Action::Help, None)
            } else {
                parse_command(&cmd.text)
            };
            return Ok(Inbound::Slash(NormalizedUpdate {
                platform: Platform::Slack,
                chat_id: cmd.user_id.clone(),
                user_id: cmd.user_id,
                action,
                data,
            }));
        }

        let envelope: EventEnvelope = serde_json::from_slice(&request.body)
            .map_err(|e| WorkpulseError::Validation(format!("malformed Slack event: {e}")))?;
        Ok(match envelope {
            EventEnvelope::UrlVerification { challenge } => Inbound::Challenge(challenge),
            EventEnvelope::EventCallback { event } if event.is_human_dm() => {
                let (Some(user), Some(text)) = (event.user, event.text) else {
                    return Ok(Inbound::Ignored);
                };
                let (action, data) = parse_command(&text);
                Inbound::Event(NormalizedUpdate {
                    platform: Platform::Slack,
                    chat_id: user.clone(),
                    user_id: user,
                    action,
                    data,
                })
            }
            EventEnvelope::EventCallback { event } => {
                debug!(kind = %event.kind, "ignoring Slack event");
                Inbound::Ignored
            }
            EventEnvelope::Other => Inbound::Ignored,
        })
    }

    async fn post_message(&self, destination: &str, content: &str) -> Result<(), WorkpulseError> {
        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base_url))
            .bearer_auth(&self.bot_token)
            .json(&json!({
                "channel": destination,
                "text": content,
                "mrkdwn": false,
            }))
            .send()
            .await
            .map_err(|e| transport_error(e, "chat.postMessage"))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        match status {
            429 => {
                return Err(WorkpulseError::RateLimited {
                    platform: Platform::Slack,
                    retry_after,
                });
            }
            403 => return Err(blocked(destination)),
            _ => {}
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, "chat.postMessage"))?;
        if body.ok {
            return Ok(());
        }
        let error = body.error.unwrap_or_else(|| "unknown_error".to_string());
        Err(match error.as_str() {
            code if BLOCKED_ERRORS.contains(&code) => blocked(destination),
            "ratelimited" => WorkpulseError::RateLimited {
                platform: Platform::Slack,
                retry_after,
            },
            _ => WorkpulseError::dispatch(Platform::Slack, format!("chat.postMessage: {error}")),
        })
    }
}

fn blocked(destination: &str) -> WorkpulseError {
    WorkpulseError::RecipientBlocked {
        platform: Platform::Slack,
        destination: destination.to_string(),
    }
}

fn transport_error(e: reqwest::Error, method: &str) -> WorkpulseError {
    WorkpulseError::PlatformDispatch {
        platform: Platform::Slack,
        message: format!("{method} request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

impl std::fmt::Debug for SlackAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackAdapter")
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PlatformAdapter for SlackAdapter {
    fn platform(&self) -> Platform {
        Platform::Slack
    }

    async fn send_message(
        &self,
        destination: &str,
        content: &str,
        _options: &SendOptions,
    ) -> Result<(), WorkpulseError> {
        self.guard
            .send(Platform::Slack, destination, || {
                self.post_message(destination, content)
            })
            .await
    }

    fn validate_webhook(&self, request: &WebhookRequest) -> bool {
        self.authenticate(request).is_ok()
    }

    fn parse_update(
        &self,
        request: &WebhookRequest,
    ) -> Result<Option<NormalizedUpdate>, WorkpulseError> {
        Ok(match self.classify(request)? {
            Inbound::Slash(update) | Inbound::Event(update) => Some(update),
            Inbound::Challenge(_) | Inbound::Ignored => None,
        })
    }

    async fn handle_webhook(
        &self,
        request: &WebhookRequest,
        commands: &dyn CommandHandler,
    ) -> WebhookResponse {
        if let Err(e) = self.authenticate(request) {
            return WebhookResponse::from_error(&e);
        }
        if let Some(retry) = request.header(RETRY_NUM_HEADER) {
            debug!(retry, "acknowledging Slack retry without reprocessing");
            return WebhookResponse::ok();
        }

        let inbound = match self.classify(request) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = %e, "failed to parse Slack request");
                return WebhookResponse::bad_request("malformed request");
            }
        };

        match inbound {
            Inbound::Challenge(challenge) => {
                WebhookResponse::json(200, &json!({ "challenge": challenge }))
            }
            Inbound::Ignored => WebhookResponse::ok(),
            Inbound::Slash(update) => {
                let reply = commands.handle(update).await;
                if reply.is_silent() {
                    return WebhookResponse::text(200, "");
                }
                WebhookResponse::json(
                    200,
                    &json!({ "response_type": "ephemeral", "text": reply.text }),
                )
            }
            Inbound::Event(update) => {
                let chat_id = update.chat_id.clone();
                let reply = commands.handle(update).await;
                if !reply.is_silent()
                    && let Err(e) = self
                        .send_message(&chat_id, &reply.text, &SendOptions::default())
                        .await
                {
                    warn!(%chat_id, error = %e, "failed to send command reply");
                }
                WebhookResponse::ok()
            }
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, WorkpulseError> {
        let response = match self
            .client
            .post(format!("{}/auth.test", self.api_base_url))
            .bearer_auth(&self.bot_token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Ok(HealthStatus::Unhealthy(format!("Slack API unreachable: {e}")));
            }
        };
        match response.json::<ApiResponse>().await {
            Ok(body) if body.ok => Ok(HealthStatus::Healthy),
            Ok(body) => Ok(HealthStatus::Degraded(format!(
                "auth.test failed: {}",
                body.error.unwrap_or_default()
            ))),
            Err(e) => Ok(HealthStatus::Degraded(format!("auth.test: {e}"))),
        }
    }
}
