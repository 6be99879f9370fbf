// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::types::NormalizedUpdate;

/// Text sent back to the user who issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub text: String,
}

impl CommandReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// A reply that must not be sent (e.g. the user just blocked the bot).
    pub fn silent() -> Self {
        Self {
            text: String::new(),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.text.is_empty()
    }
}

/// Executes a normalized user intent. Failures become user-facing replies.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, update: NormalizedUpdate) -> CommandReply;
}
