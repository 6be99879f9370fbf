// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use workpulse_core::{ReportFormatter, ReportItem, SendOptions, StructuredReport};

use crate::markdown::{MAX_MESSAGE_CHARS, chunk_message, escape_markdown_v2};

/// Renders reports as escaped MarkdownV2, split at Telegram's length limit.
#[derive(Debug, Clone)]
pub struct TelegramFormatter {
    max_chars: usize,
}

impl TelegramFormatter {
    pub fn new() -> Self {
        Self {
            max_chars: MAX_MESSAGE_CHARS,
        }
    }

    /// Override the chunk size. Values below 2 are raised to 2.
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(2),
        }
    }

    pub fn render(&self, report: &StructuredReport) -> String {
        let mut out = String::from("*Daily summary*\n");
        for (title, items) in report.sections() {
            out.push('\n');
            out.push('*');
            out.push_str(&escape_markdown_v2(title));
            out.push_str("*\n");
            if items.is_empty() {
                out.push_str("_No items_\n");
            } else {
                for item in items {
                    out.push_str(&render_item(item));
                }
            }
        }
        out
    }
}

impl Default for TelegramFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn render_item(item: &ReportItem) -> String {
    format!(
        "• {}: {}\n",
        escape_markdown_v2(&item.project),
        escape_markdown_v2(&item.task)
    )
}

impl ReportFormatter for TelegramFormatter {
    fn format(&self, report: &StructuredReport) -> Vec<String> {
        chunk_message(&self.render(report), self.max_chars)
    }

    fn send_options(&self) -> SendOptions {
        SendOptions::markdown_v2()
    }
}

#[cfg(test)]
mod tests {
    use workpulse_core::ParseMode;

    use super::*;

    fn sample() -> StructuredReport {
        StructuredReport {
            completed: vec![ReportItem::new("api", "shipped v1.2 (finally!)")],
            incomplete: vec![],
            planned: vec![ReportItem::new("docs", "write_readme")],
        }
    }

    #[test]
    fn renders_sections_in_order_with_escaping() {
        let text = TelegramFormatter::new().render(&sample());
        assert_eq!(
            text,
            "*Daily summary*\n\
             \n*Completed*\n• api: shipped v1\\.2 \\(finally\\!\\)\n\
             \n*Incomplete*\n_No items_\n\
             \n*Planned*\n• docs: write\\_readme\n"
        );
    }

    #[test]
    fn empty_report_renders_every_section() {
        let chunks = TelegramFormatter::new().format(&StructuredReport::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].matches("_No items_").count(), 3);
    }

    #[test]
    fn long_report_is_chunked_on_line_boundaries() {
        let report = StructuredReport {
            completed: (0..300)
                .map(|i| ReportItem::new(format!("project-{i}"), "a task that took a while"))
                .collect(),
            ..Default::default()
        };
        let formatter = TelegramFormatter::new();
        let chunks = formatter.format(&report);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= MAX_MESSAGE_CHARS);
        }
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.ends_with('\n'));
        }
        assert_eq!(chunks.concat(), formatter.render(&report));
    }

    #[test]
    fn uses_markdown_v2() {
        assert_eq!(
            TelegramFormatter::new().send_options().parse_mode,
            ParseMode::MarkdownV2
        );
    }
}
