// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram adapter for Workpulse.
//!
//! Receives updates through the Bot API webhook, authenticated by the
//! secret-token header, and delivers messages through teloxide's [`Bot`].
//! Only private chats are served.

pub mod format;
pub mod handler;
pub mod markdown;

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ParseMode as TelegramParseMode, Update};
use teloxide::{ApiError, RequestError};
use tracing::{debug, info, warn};
use workpulse_config::TelegramConfig;
use workpulse_core::{
    CommandHandler, HealthStatus, NormalizedUpdate, ParseMode, Platform, PlatformAdapter,
    RuntimeMode, SendOptions, WebhookRequest, WebhookResponse, WorkpulseError,
};
use workpulse_resilience::OutboundGuard;
use workpulse_security::SharedSecretVerifier;

pub use format::TelegramFormatter;

use crate::markdown::unescape_markdown_v2;

pub struct TelegramAdapter {
    bot: Bot,
    /// Kept only to scrub it from error text.
    token: String,
    verifier: SharedSecretVerifier,
    guard: Arc<OutboundGuard>,
}

impl TelegramAdapter {
    /// Requires `telegram.bot_token`, and `telegram.webhook_secret` in production mode.
    pub fn new(
        config: &TelegramConfig,
        mode: RuntimeMode,
        guard: Arc<OutboundGuard>,
    ) -> Result<Self, WorkpulseError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            WorkpulseError::Config("telegram.bot_token is required for the Telegram adapter".into())
        })?;
        if token.is_empty() {
            return Err(WorkpulseError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let verifier = SharedSecretVerifier::telegram(config.webhook_secret.clone(), mode);
        verifier.ensure_configured()?;

        let api_url = reqwest::Url::parse(&config.api_base_url).map_err(|e| {
            WorkpulseError::Config(format!(
                "telegram.api_base_url `{}` is not a valid URL: {e}",
                config.api_base_url
            ))
        })?;

        Ok(Self {
            bot: Bot::new(token).set_api_url(api_url),
            token: token.to_string(),
            verifier,
            guard,
        })
    }

    async fn send_once(
        &self,
        chat_id: ChatId,
        content: &str,
        markdown: bool,
    ) -> Result<(), RequestError> {
        if !markdown {
            return self.bot.send_message(chat_id, content).await.map(|_| ());
        }
        match self
            .bot
            .send_message(chat_id, content)
            .parse_mode(TelegramParseMode::MarkdownV2)
            .await
        {
            Ok(_) => Ok(()),
            Err(RequestError::Api(ApiError::CantParseEntities(description))) => {
                warn!(error = %description, "MarkdownV2 rejected, sending as plain text");
                self.bot
                    .send_message(chat_id, unescape_markdown_v2(content))
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    fn authenticate(&self, request: &WebhookRequest) -> Result<(), WorkpulseError> {
        self.verifier.verify_request(request).map_err(|rejection| {
            warn!(%rejection, "rejected Telegram webhook");
            rejection.into_error(Platform::Telegram)
        })
    }

    /// Network errors may carry the request URL, which embeds the token.
    fn redact(&self, text: String) -> String {
        text.replace(&self.token, "<token>")
    }

    fn map_error(&self, e: RequestError, destination: &str) -> WorkpulseError {
        match e {
            RequestError::Api(
                ApiError::BotBlocked
                | ApiError::UserDeactivated
                | ApiError::CantInitiateConversation
                | ApiError::BotKicked,
            ) => WorkpulseError::RecipientBlocked {
                platform: Platform::Telegram,
                destination: destination.to_string(),
            },
            RequestError::RetryAfter(wait) => WorkpulseError::RateLimited {
                platform: Platform::Telegram,
                retry_after: Some(wait.duration()),
            },
            other => WorkpulseError::dispatch(Platform::Telegram, self.redact(other.to_string())),
        }
    }
}

impl std::fmt::Debug for TelegramAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramAdapter").finish_non_exhaustive()
    }
}

/// Telegram chat ids are signed integers; anything else cannot be a DM.
fn parse_chat_id(destination: &str) -> Result<ChatId, WorkpulseError> {
    destination.parse::<i64>().map(ChatId).map_err(|e| {
        WorkpulseError::Validation(format!("invalid Telegram chat id `{destination}`: {e}"))
    })
}

#[async_trait]
impl PlatformAdapter for TelegramAdapter {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn send_message(
        &self,
        destination: &str,
        content: &str,
        options: &SendOptions,
    ) -> Result<(), WorkpulseError> {
        let chat_id = parse_chat_id(destination)?;
        let markdown = options.parse_mode == ParseMode::MarkdownV2;
        self.guard
            .send(Platform::Telegram, destination, || async move {
                self.send_once(chat_id, content, markdown)
                    .await
                    .map_err(|e| self.map_error(e, destination))
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
        let update: Update = serde_json::from_slice(&request.body)
            .map_err(|e| WorkpulseError::Validation(format!("malformed Telegram update: {e}")))?;
        Ok(handler::normalize(update))
    }

    async fn handle_webhook(
        &self,
        request: &WebhookRequest,
        commands: &dyn CommandHandler,
    ) -> WebhookResponse {
        if let Err(e) = self.authenticate(request) {
            return WebhookResponse::from_error(&e);
        }

        let update = match self.parse_update(request) {
            Ok(Some(update)) => update,
            Ok(None) => return WebhookResponse::ok(),
            Err(e) => {
                warn!(error = %e, "failed to parse Telegram update");
                return WebhookResponse::bad_request("malformed update");
            }
        };

        let chat_id = update.chat_id.clone();
        let action = update.action;
        let reply = commands.handle(update).await;
        if !reply.is_silent()
            && let Err(e) = self
                .send_message(&chat_id, &reply.text, &SendOptions::default())
                .await
        {
            warn!(%chat_id, ?action, error = %e, "failed to send command reply");
        }
        WebhookResponse::ok()
    }

    async fn health_check(&self) -> Result<HealthStatus, WorkpulseError> {
        match self.bot.get_me().await {
            Ok(me) => {
                info!(
                    bot = me.user.username.as_deref().unwrap_or("unknown"),
                    "Telegram bot reachable"
                );
                Ok(HealthStatus::Healthy)
            }
            Err(RequestError::Network(e)) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram API unreachable: {}",
                self.redact(e.to_string())
            ))),
            Err(e) => {
                debug!(error = %self.redact(e.to_string()), "getMe failed");
                Ok(HealthStatus::Degraded(format!(
                    "Telegram getMe failed: {}",
                    self.redact(e.to_string())
                )))
            }
        }
    }
}
