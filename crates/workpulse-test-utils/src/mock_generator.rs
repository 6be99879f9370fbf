// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic [`ReportGenerator`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use workpulse_core::{ReportGenerator, ReportItem, StructuredReport, WorkpulseError};

/// Echoes the input as a single completed item, unless the text contains a
/// configured failure marker.
#[derive(Default)]
pub struct MockReportGenerator {
    fail_marker: Option<String>,
    calls: Mutex<Vec<(String, bool)>>,
}

impl MockReportGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with a provider error whenever the input contains `marker`.
    pub fn failing_on(marker: impl Into<String>) -> Self {
        Self {
            fail_marker: Some(marker.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(text, verbose)` of every call so far.
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// The report returned for `text` when it does not fail.
    pub fn report_for(text: &str) -> StructuredReport {
        StructuredReport {
            completed: vec![ReportItem::new("general", text)],
            ..Default::default()
        }
    }
}

#[async_trait]
impl ReportGenerator for MockReportGenerator {
    async fn generate(
        &self,
        text: &str,
        verbose: bool,
    ) -> Result<StructuredReport, WorkpulseError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((text.to_string(), verbose));
        }
        if let Some(marker) = &self.fail_marker
            && text.contains(marker.as_str())
        {
            return Err(WorkpulseError::Provider {
                message: format!("mock generator refused input containing {marker:?}"),
                source: None,
            });
        }
        Ok(Self::report_for(text))
    }
}
