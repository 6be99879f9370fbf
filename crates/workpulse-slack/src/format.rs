// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use workpulse_core::{ReportFormatter, StructuredReport};

/// Plain bulleted text in a single message. Slack has no practical limit
/// for these reports, so nothing is split.
#[derive(Debug, Clone, Default)]
pub struct SlackFormatter;

impl SlackFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportFormatter for SlackFormatter {
    fn format(&self, report: &StructuredReport) -> Vec<String> {
        let mut out = String::from("Daily summary\n");
        for (title, items) in report.sections() {
            out.push('\n');
            out.push_str(title);
            out.push('\n');
            if items.is_empty() {
                out.push_str("No items\n");
            }
            for item in items {
                out.push_str(&format!("• {}: {}\n", item.project, item.task));
            }
        }
        vec![out]
    }
}
