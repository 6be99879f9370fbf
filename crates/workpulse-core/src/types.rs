// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits, the record store and the scheduler.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::WorkpulseError;

/// Messaging platform identifier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Slack,
    Telegram,
}

impl Platform {
    /// Every supported platform, in a stable order.
    pub const ALL: [Platform; 2] = [Platform::Slack, Platform::Telegram];

    /// Human-readable label for replies.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Slack => "Slack",
            Platform::Telegram => "Telegram",
        }
    }
}

/// Whether the process runs against real users or a developer machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Production,
    Development,
}

/// A person receiving daily summaries on one or more platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Platform-neutral user id (the id reported by the first platform used).
    pub id: String,
    /// Destination chat id per platform, present once known.
    pub platforms: BTreeMap<Platform, String>,
    /// Platforms currently receiving notifications.
    pub enabled: BTreeSet<Platform>,
    pub subscribed_at: DateTime<Utc>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
}

impl Subscriber {
    /// A subscriber with no destinations and nothing enabled.
    pub fn new(id: impl Into<String>, subscribed_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            platforms: BTreeMap::new(),
            enabled: BTreeSet::new(),
            subscribed_at,
            last_sent_at: None,
            timezone: None,
        }
    }

    /// Record the destination for a platform and turn delivery on for it.
    pub fn enable(&mut self, platform: Platform, chat_id: impl Into<String>) {
        self.platforms.insert(platform, chat_id.into());
        self.enabled.insert(platform);
    }

    /// Stop delivery on a platform. The destination is kept for re-subscribes.
    pub fn disable(&mut self, platform: Platform) -> bool {
        self.enabled.remove(&platform)
    }

    pub fn is_enabled(&self, platform: Platform) -> bool {
        self.enabled.contains(&platform)
    }

    /// A subscriber belongs in the active index iff this holds.
    pub fn is_active(&self) -> bool {
        !self.enabled.is_empty()
    }

    pub fn destination(&self, platform: Platform) -> Option<&str> {
        self.platforms.get(&platform).map(String::as_str)
    }
}

/// A free-text work update. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkEntry {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One line of a structured report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    pub project: String,
    pub task: String,
}

impl ReportItem {
    pub fn new(project: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            task: task.into(),
        }
    }
}

/// Summary of a work update, grouped into three ordered sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub completed: Vec<ReportItem>,
    pub incomplete: Vec<ReportItem>,
    pub planned: Vec<ReportItem>,
}

impl StructuredReport {
    /// Section titles paired with their items, in rendering order.
    pub fn sections(&self) -> [(&'static str, &[ReportItem]); 3] {
        [
            ("Completed", &self.completed),
            ("Incomplete", &self.incomplete),
            ("Planned", &self.planned),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.incomplete.is_empty() && self.planned.is_empty()
    }
}

/// What the user asked for in an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Subscribe,
    Unsubscribe,
    Status,
    Help,
    /// Free text to be stored as a work entry.
    WorkUpdate,
    /// The platform reported that the user removed or blocked the bot.
    Blocked,
}

/// Provider payload reduced to the fields command handling needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUpdate {
    pub platform: Platform,
    pub user_id: String,
    pub chat_id: String,
    pub action: Action,
    pub data: Option<String>,
}

/// Raw inbound webhook request. Header names are lowercase.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl WebhookRequest {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Builder-style header insertion, used by tests and the gateway.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Media type without parameters, e.g. `application/json`.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
    }
}

/// HTTP reply produced by an adapter for the gateway to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl WebhookResponse {
    pub fn ok() -> Self {
        Self::text(200, "ok")
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::text(401, "unauthorized")
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::text(400, reason)
    }

    /// Response for an error raised while handling a webhook. Only
    /// validation errors echo their message back to the caller.
    pub fn from_error(err: &WorkpulseError) -> Self {
        match err {
            WorkpulseError::Authentication { .. } => Self::unauthorized(),
            WorkpulseError::Validation(reason) => Self::bad_request(reason.clone()),
            WorkpulseError::AdapterNotFound { .. } => Self::text(404, "not found"),
            WorkpulseError::Timeout { .. } => Self::text(504, "timeout"),
            _ => Self::text(500, "internal error"),
        }
    }
}

/// Markup interpretation requested for an outbound message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Plain,
    MarkdownV2,
}

/// Per-message delivery options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub parse_mode: ParseMode,
}

impl SendOptions {
    pub fn markdown_v2() -> Self {
        Self {
            parse_mode: ParseMode::MarkdownV2,
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}
