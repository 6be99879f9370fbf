// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text command recognition shared by the platform adapters.

use crate::types::Action;

/// Map message text to an action and its free-text payload.
///
/// Accepts `/command`, `/command@botname` and bare keywords (the argument of a
/// Slack slash command). Anything else is a work update carrying the trimmed text.
pub fn parse_command(text: &str) -> (Action, Option<String>) {
    let trimmed = text.trim();

    if let Some(rest) = trimmed.strip_prefix('/') {
        let word = rest.split_whitespace().next().unwrap_or_default();
        let word = word.split('@').next().unwrap_or_default();
        let action = keyword(word).unwrap_or(Action::Help);
        return (action, None);
    }

    if let Some(action) = keyword(trimmed) {
        return (action, None);
    }

    (Action::WorkUpdate, Some(trimmed.to_string()))
}

fn keyword(word: &str) -> Option<Action> {
    match word.to_ascii_lowercase().as_str() {
        "subscribe" => Some(Action::Subscribe),
        "unsubscribe" | "stop" => Some(Action::Unsubscribe),
        "status" => Some(Action::Status),
        "help" | "start" => Some(Action::Help),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_commands() {
        assert_eq!(parse_command("/subscribe"), (Action::Subscribe, None));
        assert_eq!(parse_command("/unsubscribe"), (Action::Unsubscribe, None));
        assert_eq!(parse_command("/status"), (Action::Status, None));
        assert_eq!(parse_command("/help"), (Action::Help, None));
        assert_eq!(parse_command("/start"), (Action::Help, None));
    }

    #[test]
    fn bot_mention_suffix_is_ignored() {
        assert_eq!(
            parse_command("/subscribe@workpulse_bot"),
            (Action::Subscribe, None)
        );
    }

    #[test]
    fn unknown_slash_command_shows_help() {
        assert_eq!(parse_command("/frobnicate"), (Action::Help, None));
    }

    #[test]
    fn bare_keywords_are_case_insensitive() {
        assert_eq!(parse_command("  Subscribe "), (Action::Subscribe, None));
        assert_eq!(parse_command("STATUS"), (Action::Status, None));
    }

    #[test]
    fn other_text_is_a_work_update() {
        let (action, data) = parse_command("  finished the API migration\n");
        assert_eq!(action, Action::WorkUpdate);
        assert_eq!(data.as_deref(), Some("finished the API migration"));
    }

    #[test]
    fn keyword_inside_sentence_is_a_work_update() {
        let (action, _) = parse_command("fixed status page");
        assert_eq!(action, Action::WorkUpdate);
    }

    #[test]
    fn empty_text_is_an_empty_work_update() {
        assert_eq!(
            parse_command("   "),
            (Action::WorkUpdate, Some(String::new()))
        );
    }
}
