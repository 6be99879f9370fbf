// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every Workpulse crate.

use std::time::Duration;

use thiserror::Error;

use crate::types::Platform;

/// The primary error type used across adapter traits and core operations.
#[derive(Debug, Error)]
pub enum WorkpulseError {
    /// Configuration errors (invalid TOML, missing secrets, bad cron expression).
    #[error("configuration error: {0}")]
    Config(String),

    /// Inbound request failed webhook verification. Nothing is mutated.
    #[error("authentication failed for {platform}: {reason}")]
    Authentication { platform: Platform, reason: String },

    /// User input rejected before any state change.
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Report generator failures (API failure, malformed report).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The platform refused delivery because the recipient blocked or removed the bot.
    #[error("recipient {destination} blocked delivery on {platform}")]
    RecipientBlocked {
        platform: Platform,
        destination: String,
    },

    /// The platform asked us to slow down.
    #[error("rate limited by {platform}")]
    RateLimited {
        platform: Platform,
        retry_after: Option<Duration>,
    },

    /// Any other outbound send failure.
    #[error("dispatch to {platform} failed: {message}")]
    PlatformDispatch {
        platform: Platform,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No adapter registered for the requested platform.
    #[error("no adapter registered for {platform}")]
    AdapterNotFound { platform: Platform },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkpulseError {
    /// Wrap any error as a storage failure.
    pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        WorkpulseError::Storage {
            source: Box::new(e),
        }
    }

    /// Build a dispatch error without an underlying source.
    pub fn dispatch(platform: Platform, message: impl Into<String>) -> Self {
        WorkpulseError::PlatformDispatch {
            platform,
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for the one send failure that changes subscription state.
    pub fn is_recipient_blocked(&self) -> bool {
        matches!(self, WorkpulseError::RecipientBlocked { .. })
    }
}
