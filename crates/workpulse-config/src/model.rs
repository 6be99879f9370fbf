// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use workpulse_core::RuntimeMode;

/// Top-level Workpulse configuration.
///
/// Every section is optional and defaults to sensible values. Platform
/// integrations are off until their bot token is set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkpulseConfig {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub slack: SlackConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

/// Process identity and runtime mode.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `production` fails closed on missing webhook secrets.
    #[serde(default)]
    pub mode: RuntimeMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
            mode: RuntimeMode::default(),
        }
    }
}

fn default_app_name() -> String {
    "workpulse".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP listener for inbound webhooks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("workpulse").join("workpulse.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "workpulse.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// When `last_sent_at` advances after a scheduled run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastSentPolicy {
    /// After every processed subscriber, even if every platform failed.
    #[default]
    OnAttempt,
    /// Only when at least one platform received the full report.
    OnDelivery,
}

/// Fan-out trigger and batching.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Run the cron trigger inside `serve`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Full cron expression (local time). Takes precedence over `hour`/`minute`.
    #[serde(default)]
    pub cron: Option<String>,

    /// Daily trigger hour (local time) when `cron` is unset.
    #[serde(default = "default_hour")]
    pub hour: u32,

    #[serde(default)]
    pub minute: u32,

    /// Subscribers processed concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Ask the report generator for more detailed task descriptions.
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub last_sent_policy: LastSentPolicy,
}

impl ScheduleConfig {
    /// The effective cron expression for the trigger.
    pub fn cron_expression(&self) -> String {
        match &self.cron {
            Some(expr) => expr.clone(),
            None => format!("{} {} * * *", self.minute, self.hour),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: None,
            hour: default_hour(),
            minute: 0,
            batch_size: default_batch_size(),
            verbose: false,
            last_sent_policy: LastSentPolicy::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_hour() -> u32 {
    17
}

fn default_batch_size() -> usize {
    10
}

/// Slack app integration. `bot_token = None` disables Slack.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Signing secret for request verification. Required when Slack is on.
    #[serde(default)]
    pub signing_secret: Option<String>,

    #[serde(default = "default_slack_api")]
    pub api_base_url: String,
}

impl SlackConfig {
    pub fn is_enabled(&self) -> bool {
        self.bot_token.is_some()
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            signing_secret: None,
            api_base_url: default_slack_api(),
        }
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &redacted(&self.bot_token))
            .field("signing_secret", &redacted(&self.signing_secret))
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

fn default_slack_api() -> String {
    "https://slack.com/api".to_string()
}

/// Telegram bot integration. `bot_token = None` disables Telegram.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Value Telegram echoes in `X-Telegram-Bot-Api-Secret-Token`.
    /// Mandatory in production mode.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    #[serde(default = "default_telegram_api")]
    pub api_base_url: String,
}

impl TelegramConfig {
    pub fn is_enabled(&self) -> bool {
        self.bot_token.is_some()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            webhook_secret: None,
            api_base_url: default_telegram_api(),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &redacted(&self.bot_token))
            .field("webhook_secret", &redacted(&self.webhook_secret))
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

/// Outbound protection shared by all platform adapters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Sends allowed per destination within one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Total attempts per message when the provider rate-limits us.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_max_requests() -> u32 {
    1
}

fn default_window_secs() -> u64 {
    1
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

/// Anthropic API configuration for report generation.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` falls back to `ANTHROPIC_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            base_url: default_anthropic_base_url(),
        }
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn redacted(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_minute_build_daily_expression() {
        let schedule = ScheduleConfig {
            hour: 9,
            minute: 30,
            ..Default::default()
        };
        assert_eq!(schedule.cron_expression(), "30 9 * * *");
    }

    #[test]
    fn explicit_cron_wins() {
        let schedule = ScheduleConfig {
            cron: Some("0 17 * * 1-5".into()),
            hour: 9,
            ..Default::default()
        };
        assert_eq!(schedule.cron_expression(), "0 17 * * 1-5");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let telegram = TelegramConfig {
            bot_token: Some("123:secret-token".into()),
            webhook_secret: Some("hunter2".into()),
            ..Default::default()
        };
        let debug = format!("{telegram:?}");
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));

        let anthropic = AnthropicConfig {
            api_key: Some("sk-ant-abc".into()),
            ..Default::default()
        };
        assert!(!format!("{anthropic:?}").contains("sk-ant-abc"));
    }

    #[test]
    fn production_is_default_mode() {
        assert_eq!(AppConfig::default().mode, RuntimeMode::Production);
    }
}
