// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers constraints serde cannot express: value ranges, parseable cron
//! expressions and the secrets each enabled platform needs to authenticate
//! its webhooks.

use workpulse_core::RuntimeMode;

use crate::diagnostic::ConfigError;
use crate::model::WorkpulseConfig;

/// Validate a deserialized configuration, collecting every failure.
pub fn validate_config(config: &WorkpulseConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    validate_schedule(config, &mut errors);
    validate_rate_limit(config, &mut errors);
    validate_platform_secrets(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_schedule(config: &WorkpulseConfig, errors: &mut Vec<ConfigError>) {
    let schedule = &config.schedule;

    if schedule.batch_size == 0 {
        errors.push(ConfigError::validation(
            "schedule.batch_size must be at least 1",
        ));
    }

    if schedule.cron.is_none() {
        if schedule.hour > 23 {
            errors.push(ConfigError::validation(format!(
                "schedule.hour must be between 0 and 23, got {}",
                schedule.hour
            )));
        }
        if schedule.minute > 59 {
            errors.push(ConfigError::validation(format!(
                "schedule.minute must be between 0 and 59, got {}",
                schedule.minute
            )));
        }
    }

    let expr = schedule.cron_expression();
    if let Err(e) = expr.parse::<croner::Cron>() {
        errors.push(ConfigError::InvalidValue {
            key: "schedule.cron".to_string(),
            detail: format!("`{expr}` is not a valid cron expression: {e}"),
        });
    }
}

fn validate_rate_limit(config: &WorkpulseConfig, errors: &mut Vec<ConfigError>) {
    let limits = &config.rate_limit;

    if limits.max_requests == 0 {
        errors.push(ConfigError::validation(
            "rate_limit.max_requests must be at least 1",
        ));
    }
    if limits.window_secs == 0 {
        errors.push(ConfigError::validation(
            "rate_limit.window_secs must be at least 1",
        ));
    }
    if !(1..=5).contains(&limits.max_attempts) {
        errors.push(ConfigError::validation(format!(
            "rate_limit.max_attempts must be between 1 and 5, got {}",
            limits.max_attempts
        )));
    }
    if limits.base_backoff_ms > limits.max_backoff_ms {
        errors.push(ConfigError::validation(format!(
            "rate_limit.base_backoff_ms ({}) must not exceed rate_limit.max_backoff_ms ({})",
            limits.base_backoff_ms, limits.max_backoff_ms
        )));
    }
}

/// Slack requests are always signed, so the signing secret is mandatory.
/// Telegram's shared secret may only be omitted in development mode.
fn validate_platform_secrets(config: &WorkpulseConfig, errors: &mut Vec<ConfigError>) {
    if config.slack.is_enabled() && is_blank(&config.slack.signing_secret) {
        errors.push(ConfigError::MissingSecret {
            key: "slack.signing_secret".to_string(),
            platform: "Slack".to_string(),
            env: "WORKPULSE_SLACK_SIGNING_SECRET".to_string(),
        });
    }

    if config.telegram.is_enabled()
        && config.app.mode == RuntimeMode::Production
        && is_blank(&config.telegram.webhook_secret)
    {
        errors.push(ConfigError::MissingSecret {
            key: "telegram.webhook_secret".to_string(),
            platform: "Telegram in production mode".to_string(),
            env: "WORKPULSE_TELEGRAM_WEBHOOK_SECRET".to_string(),
        });
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}
