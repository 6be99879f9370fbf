// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MarkdownV2 escaping and length-bounded chunking for the Telegram Bot API.

/// Telegram's limit for a single message text.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Characters Telegram treats as MarkdownV2 markup.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape every markup-significant character (and the backslash itself).
///
/// Report content is user-supplied free text, so nothing is passed through
/// as markup, code spans included.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        if ch == '\\' || SPECIAL_CHARS.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Undo [`escape_markdown_v2`] for a plain-text resend.
pub fn unescape_markdown_v2(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                plain.push(next);
            }
        } else {
            plain.push(ch);
        }
    }
    plain
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Each chunk ends just after the last newline that fits; a chunk is cut
/// mid-line only when a single line is longer than `max_chars`, and never
/// between an escaping backslash and the character it escapes.
/// `chunks.concat() == text` always holds.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(2);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max_chars {
        // Byte offset just past the first `max_chars` characters.
        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..window_end];

        let split = match window.rfind('\n') {
            Some(nl) => nl + 1,
            None => avoid_splitting_escape(window),
        };

        chunks.push(rest[..split].to_string());
        rest = &rest[split..];
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

/// Back off one character if the window ends inside a `\x` escape pair.
fn avoid_splitting_escape(window: &str) -> usize {
    let trailing_backslashes = window.chars().rev().take_while(|&c| c == '\\').count();
    if trailing_backslashes % 2 == 1 {
        window.len() - 1
    } else {
        window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(escape_markdown_v2("Hello world"), "Hello world");
    }

    #[test]
    fn escapes_all_special_characters() {
        let input = "_*[]()~`>#+-=|{}.!";
        let expected: String = input.chars().flat_map(|c| ['\\', c]).collect();
        assert_eq!(escape_markdown_v2(input), expected);
    }

    #[test]
    fn escapes_backslash_and_code_spans() {
        assert_eq!(escape_markdown_v2(r"a\b"), r"a\\b");
        assert_eq!(escape_markdown_v2("`code`"), r"\`code\`");
    }

    #[test]
    fn unescape_reverses_escape() {
        let text = r"v1.2 (done) \ a_b";
        assert_eq!(unescape_markdown_v2(&escape_markdown_v2(text)), text);
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_message("hello", 10), vec!["hello"]);
        assert_eq!(chunk_message("", 10), vec![""]);
    }

    #[test]
    fn splits_after_last_newline_before_limit() {
        let text = "line one\nline two\nline three";
        let chunks = chunk_message(text, 20);
        assert_eq!(chunks, vec!["line one\nline two\n", "line three"]);
    }

    #[test]
    fn hard_splits_overlong_line() {
        let chunks = chunk_message("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn hard_split_keeps_escape_pairs_together() {
        // "abc\." would be cut between '\' and '.' at max 4.
        let chunks = chunk_message(r"abc\.def", 4);
        assert_eq!(chunks, vec!["abc", r"\.de", "f"]);
    }

    #[test]
    fn escaped_backslash_pair_may_end_a_chunk() {
        let chunks = chunk_message(r"ab\\cd", 4);
        assert_eq!(chunks, vec![r"ab\\", "cd"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ééééé";
        let chunks = chunk_message(text, 2);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn telegram_limit_splits_near_boundary() {
        let line = format!("{}\n", "x".repeat(99));
        let text = line.repeat(50); // 5000 chars
        let chunks = chunk_message(&text, MAX_MESSAGE_CHARS);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 4000);
        assert!(chunks[0].ends_with('\n'));
        assert_eq!(chunks.concat(), text);
    }

    proptest! {
        #[test]
        fn chunks_concatenate_and_fit(text in "[a-z\\\\.\n ]{0,300}", max in 2usize..40) {
            let chunks = chunk_message(&text, max);
            prop_assert_eq!(chunks.concat(), text.clone());
            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= max);
            }
        }

        #[test]
        fn escaped_chunks_never_end_mid_escape(text in "[a-z._!*\\\\ ]{0,200}", max in 2usize..30) {
            let escaped = escape_markdown_v2(&text);
            for chunk in chunk_message(&escaped, max) {
                let trailing = chunk.chars().rev().take_while(|&c| c == '\\').count();
                prop_assert_eq!(trailing % 2, 0);
            }
        }
    }
}
