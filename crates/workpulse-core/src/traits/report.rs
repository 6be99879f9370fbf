// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report generation and per-platform rendering.

use async_trait::async_trait;

use crate::error::WorkpulseError;
use crate::types::{SendOptions, StructuredReport};

/// Turns free text into a [`StructuredReport`].
///
/// Any reply outside the three-section contract must come back as
/// [`WorkpulseError::Provider`].
#[async_trait]
pub trait ReportGenerator: Send + Sync + 'static {
    async fn generate(
        &self,
        text: &str,
        verbose: bool,
    ) -> Result<StructuredReport, WorkpulseError>;
}

/// Renders a report into one or more platform-ready message chunks.
pub trait ReportFormatter: Send + Sync + 'static {
    /// Chunks in delivery order. Never empty.
    fn format(&self, report: &StructuredReport) -> Vec<String>;

    /// Options every chunk must be sent with.
    fn send_options(&self) -> SendOptions {
        SendOptions::default()
    }
}
