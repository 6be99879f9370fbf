// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a Bot API [`Update`] into a [`NormalizedUpdate`].
//!
//! Only private chats are served. A `my_chat_member` update that bans the
//! bot from a private chat means the user blocked it.

use teloxide::types::{ChatKind, ChatMemberKind, ChatMemberUpdated, Message, Update, UpdateKind};
use tracing::debug;
use workpulse_core::command::parse_command;
use workpulse_core::{Action, NormalizedUpdate, Platform};

/// Checks whether the message is from a private (DM) chat.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

pub fn normalize(update: Update) -> Option<NormalizedUpdate> {
    match update.kind {
        UpdateKind::Message(msg) => from_message(&msg),
        UpdateKind::MyChatMember(member) => from_member_change(&member),
        _ => {
            debug!(update_id = update.id.0, "ignoring update kind");
            None
        }
    }
}

fn from_message(msg: &Message) -> Option<NormalizedUpdate> {
    if !is_dm(msg) {
        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
        return None;
    }
    let from = msg.from.as_ref().filter(|u| !u.is_bot)?;
    let Some(text) = msg.text() else {
        debug!(msg_id = msg.id.0, "ignoring non-text message");
        return None;
    };

    let (action, data) = parse_command(text);
    Some(NormalizedUpdate {
        platform: Platform::Telegram,
        user_id: from.id.0.to_string(),
        chat_id: msg.chat.id.0.to_string(),
        action,
        data,
    })
}

fn from_member_change(member: &ChatMemberUpdated) -> Option<NormalizedUpdate> {
    let banned = matches!(member.new_chat_member.kind, ChatMemberKind::Banned(_));
    if !member.chat.is_private() || !banned {
        return None;
    }
    Some(NormalizedUpdate {
        platform: Platform::Telegram,
        user_id: member.from.id.0.to_string(),
        chat_id: member.chat.id.0.to_string(),
        action: Action::Blocked,
        data: None,
    })
}
