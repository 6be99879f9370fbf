// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait implemented once per messaging platform.

use async_trait::async_trait;

use crate::error::WorkpulseError;
use crate::traits::command::CommandHandler;
use crate::types::{
    HealthStatus, NormalizedUpdate, Platform, SendOptions, WebhookRequest, WebhookResponse,
};

/// Uniform contract over a messaging platform.
///
/// Delivery and command logic only ever talk to this trait, so adding a
/// platform means adding an implementation and registering it.
#[async_trait]
pub trait PlatformAdapter: Send + Sync + 'static {
    /// The platform this adapter speaks for.
    fn platform(&self) -> Platform;

    /// Send one message to a destination chat.
    ///
    /// A recipient that blocked the bot surfaces as
    /// [`WorkpulseError::RecipientBlocked`]; a provider rate limit that
    /// outlasts the retry budget surfaces as [`WorkpulseError::RateLimited`].
    async fn send_message(
        &self,
        destination: &str,
        content: &str,
        options: &SendOptions,
    ) -> Result<(), WorkpulseError>;

    /// Run the platform's webhook verification against the raw request.
    fn validate_webhook(&self, request: &WebhookRequest) -> bool;

    /// Decode a verified request into a normalized update.
    ///
    /// Returns `Ok(None)` for payloads that carry no user intent (bot echoes,
    /// edits, unsupported event types).
    fn parse_update(
        &self,
        request: &WebhookRequest,
    ) -> Result<Option<NormalizedUpdate>, WorkpulseError>;

    /// Validate, parse, dispatch to the command handler and reply.
    async fn handle_webhook(
        &self,
        request: &WebhookRequest,
        commands: &dyn CommandHandler,
    ) -> WebhookResponse;

    /// Report whether the adapter can currently reach its platform.
    async fn health_check(&self) -> Result<HealthStatus, WorkpulseError> {
        Ok(HealthStatus::Healthy)
    }
}
