// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Executes normalized user intents against the record store.
//!
//! Every outcome, failures included, becomes a reply for the user. Storage
//! failures are logged and answered with a generic apology.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};
use workpulse_core::{
    Action, CommandHandler, CommandReply, NormalizedUpdate, Platform, SubscriberStore, WorkEntry,
    WorkpulseError,
};

/// Longest work update accepted, in characters.
pub const MAX_UPDATE_CHARS: usize = 4000;

pub const APOLOGY: &str = "Sorry, something went wrong on our side. Please try again later.";

pub const HELP_TEXT: &str = "Workpulse turns your work updates into a daily summary.

Commands:
  subscribe - get your daily summary on this platform
  unsubscribe - stop daily summaries on this platform
  status - show where your summaries are delivered
  help - show this message

Anything else you send is saved as your latest work update.";

pub struct CommandService {
    store: Arc<dyn SubscriberStore>,
}

impl CommandService {
    pub fn new(store: Arc<dyn SubscriberStore>) -> Self {
        Self { store }
    }

    /// Run one intent. `Validation` errors carry a user-facing message.
    pub async fn execute(&self, update: &NormalizedUpdate) -> Result<CommandReply, WorkpulseError> {
        match update.action {
            Action::Subscribe => self.subscribe(update).await,
            Action::Unsubscribe => self.unsubscribe(update).await,
            Action::Status => self.status(update).await,
            Action::Help => Ok(CommandReply::new(HELP_TEXT)),
            Action::WorkUpdate => self.record_update(update).await,
            Action::Blocked => {
                self.store
                    .disable_platform(&update.user_id, update.platform)
                    .await?;
                info!(
                    user_id = %update.user_id,
                    platform = %update.platform,
                    "bot removed by user, platform disabled"
                );
                Ok(CommandReply::silent())
            }
        }
    }

    async fn subscribe(&self, update: &NormalizedUpdate) -> Result<CommandReply, WorkpulseError> {
        let subscriber = self
            .store
            .enable_platform(&update.user_id, update.platform, &update.chat_id)
            .await?;
        info!(
            user_id = %subscriber.id,
            platform = %update.platform,
            platforms = subscriber.enabled.len(),
            "subscribed"
        );
        Ok(CommandReply::new(format!(
            "Subscribed! Your daily summary will arrive here on {}.",
            update.platform.label()
        )))
    }

    async fn unsubscribe(&self, update: &NormalizedUpdate) -> Result<CommandReply, WorkpulseError> {
        let label = update.platform.label();
        let subscribed = self
            .store
            .get_subscriber(&update.user_id)
            .await?
            .is_some_and(|s| s.is_enabled(update.platform));
        if !subscribed {
            return Ok(CommandReply::new(format!(
                "You are not subscribed on {label}."
            )));
        }

        self.store
            .disable_platform(&update.user_id, update.platform)
            .await?;
        info!(user_id = %update.user_id, platform = %update.platform, "unsubscribed");
        Ok(CommandReply::new(format!(
            "Unsubscribed. You will no longer get daily summaries on {label}."
        )))
    }

    async fn status(&self, update: &NormalizedUpdate) -> Result<CommandReply, WorkpulseError> {
        let Some(subscriber) = self.store.get_subscriber(&update.user_id).await? else {
            return Ok(CommandReply::new(
                "You are not subscribed. Send \"subscribe\" to start.",
            ));
        };

        let mut lines = vec!["Your Workpulse status:".to_string()];
        for platform in Platform::ALL {
            let state = if subscriber.is_enabled(platform) {
                "enabled"
            } else {
                "disabled"
            };
            lines.push(format!("{}: {state}", platform.label()));
        }
        lines.push(match subscriber.last_sent_at {
            Some(at) => format!("Last summary: {}", at.format("%Y-%m-%d %H:%M UTC")),
            None => "Last summary: never".to_string(),
        });
        Ok(CommandReply::new(lines.join("\n")))
    }

    async fn record_update(&self, update: &NormalizedUpdate) -> Result<CommandReply, WorkpulseError> {
        let content = validate_update(update.data.as_deref().unwrap_or_default())?;
        let entry = WorkEntry {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: update.user_id.clone(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.store.store_work_entry(&entry).await?;
        info!(
            user_id = %update.user_id,
            entry_id = %entry.id,
            chars = content.chars().count(),
            "work update stored"
        );

        let active = self
            .store
            .get_subscriber(&update.user_id)
            .await?
            .is_some_and(|s| s.is_active());
        Ok(CommandReply::new(if active {
            "Got it. Your update will be in the next daily summary."
        } else {
            "Got it. Send \"subscribe\" to receive your daily summary."
        }))
    }
}

/// Trimmed content, or a user-facing validation error.
pub fn validate_update(text: &str) -> Result<&str, WorkpulseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(WorkpulseError::Validation(
            "Your update is empty. Tell me what you worked on today.".into(),
        ));
    }
    let chars = trimmed.chars().count();
    if chars > MAX_UPDATE_CHARS {
        return Err(WorkpulseError::Validation(format!(
            "Your update is {chars} characters long; the limit is {MAX_UPDATE_CHARS}."
        )));
    }
    Ok(trimmed)
}

#[async_trait]
impl CommandHandler for CommandService {
    async fn handle(&self, update: NormalizedUpdate) -> CommandReply {
        match self.execute(&update).await {
            Ok(reply) => reply,
            Err(WorkpulseError::Validation(message)) => CommandReply::new(message),
            Err(e) => {
                error!(
                    user_id = %update.user_id,
                    platform = %update.platform,
                    action = %update.action,
                    error = %e,
                    "command failed"
                );
                if update.action == Action::Blocked {
                    CommandReply::silent()
                } else {
                    CommandReply::new(APOLOGY)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;
    use workpulse_test_utils::{FailingStore, TestHarness};

    use super::*;

    fn update(platform: Platform, action: Action, data: Option<&str>) -> NormalizedUpdate {
        NormalizedUpdate {
            platform,
            user_id: "u1".into(),
            chat_id: match platform {
                Platform::Slack => "U1".into(),
                Platform::Telegram => "42".into(),
            },
            action,
            data: data.map(str::to_string),
        }
    }

    async fn service() -> (TestHarness, CommandService) {
        let harness = TestHarness::new().await.unwrap();
        let service = CommandService::new(harness.store());
        (harness, service)
    }

    #[tokio::test]
    async fn subscribe_creates_subscriber_and_indexes_it() {
        let (harness, service) = service().await;
        let reply = service
            .handle(update(Platform::Telegram, Action::Subscribe, None))
            .await;
        assert!(reply.text.contains("Subscribed"));

        let sub = harness.store.get_subscriber("u1").await.unwrap().unwrap();
        assert!(sub.is_enabled(Platform::Telegram));
        assert_eq!(sub.destination(Platform::Telegram), Some("42"));
        assert_eq!(harness.store.list_active_subscribers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscribe_is_idempotent() {
        let (harness, service) = service().await;
        for _ in 0..2 {
            service
                .handle(update(Platform::Slack, Action::Subscribe, None))
                .await;
        }
        let sub = harness.store.get_subscriber("u1").await.unwrap().unwrap();
        assert_eq!(sub.enabled.len(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_only_touches_invoking_platform() {
        let (harness, service) = service().await;
        service
            .handle(update(Platform::Slack, Action::Subscribe, None))
            .await;
        service
            .handle(update(Platform::Telegram, Action::Subscribe, None))
            .await;

        let reply = service
            .handle(update(Platform::Slack, Action::Unsubscribe, None))
            .await;
        assert!(reply.text.contains("Slack"));

        let sub = harness.store.get_subscriber("u1").await.unwrap().unwrap();
        assert!(!sub.is_enabled(Platform::Slack));
        assert!(sub.is_enabled(Platform::Telegram));
        assert_eq!(harness.store.list_active_subscribers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn last_unsubscribe_drops_from_active_index() {
        let (harness, service) = service().await;
        service
            .handle(update(Platform::Telegram, Action::Subscribe, None))
            .await;
        service
            .handle(update(Platform::Telegram, Action::Unsubscribe, None))
            .await;
        assert!(harness.store.list_active_subscribers().await.unwrap().is_empty());
        // The record itself is kept.
        assert!(harness.store.get_subscriber("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unsubscribe_when_not_subscribed() {
        let (_harness, service) = service().await;
        let reply = service
            .handle(update(Platform::Telegram, Action::Unsubscribe, None))
            .await;
        assert_eq!(reply.text, "You are not subscribed on Telegram.");
    }

    #[tokio::test]
    async fn status_lists_platforms() {
        let (_harness, service) = service().await;
        service
            .handle(update(Platform::Telegram, Action::Subscribe, None))
            .await;
        let reply = service
            .handle(update(Platform::Telegram, Action::Status, None))
            .await;
        assert!(reply.text.contains("Slack: disabled"));
        assert!(reply.text.contains("Telegram: enabled"));
        assert!(reply.text.contains("Last summary: never"));
    }

    #[tokio::test]
    async fn status_for_unknown_user() {
        let (_harness, service) = service().await;
        let reply = service
            .handle(update(Platform::Slack, Action::Status, None))
            .await;
        assert!(reply.text.contains("not subscribed"));
    }

    #[tokio::test]
    async fn help_reply() {
        let (_harness, service) = service().await;
        let reply = service.handle(update(Platform::Slack, Action::Help, None)).await;
        assert_eq!(reply.text, HELP_TEXT);
    }

    #[tokio::test]
    async fn work_update_is_stored_trimmed() {
        let (harness, service) = service().await;
        let reply = service
            .handle(update(
                Platform::Telegram,
                Action::WorkUpdate,
                Some("  fixed the build  "),
            ))
            .await;
        assert!(reply.text.starts_with("Got it"));

        let entry = harness.store.latest_entry_for_owner("u1").await.unwrap().unwrap();
        assert_eq!(entry.content, "fixed the build");
        assert_eq!(entry.owner_id, "u1");
    }

    #[tokio::test]
    async fn empty_and_oversized_updates_are_rejected() {
        let (harness, service) = service().await;
        let reply = service
            .handle(update(Platform::Telegram, Action::WorkUpdate, Some("   ")))
            .await;
        assert!(reply.text.contains("empty"));

        let long = "x".repeat(MAX_UPDATE_CHARS + 1);
        let reply = service
            .handle(update(Platform::Telegram, Action::WorkUpdate, Some(&long)))
            .await;
        assert!(reply.text.contains("4000"));

        assert!(harness.store.list_entries_by_owner("u1").await.unwrap().is_empty());
    }

    #[test]
    fn update_at_limit_is_accepted() {
        let text = "é".repeat(MAX_UPDATE_CHARS);
        assert_eq!(validate_update(&text).unwrap().chars().count(), MAX_UPDATE_CHARS);
    }

    #[tokio::test]
    async fn blocked_disables_platform_silently() {
        let (harness, service) = service().await;
        service
            .handle(update(Platform::Telegram, Action::Subscribe, None))
            .await;
        let reply = service
            .handle(update(Platform::Telegram, Action::Blocked, None))
            .await;
        assert!(reply.is_silent());
        assert!(harness.store.list_active_subscribers().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn storage_failure_becomes_apology() {
        let service = CommandService::new(Arc::new(FailingStore));
        let reply = service
            .handle(update(Platform::Slack, Action::Subscribe, None))
            .await;
        assert_eq!(reply.text, APOLOGY);
        assert!(logs_contain("command failed"));
    }
}
