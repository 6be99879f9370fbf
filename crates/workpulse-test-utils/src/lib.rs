// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Workpulse integration tests.
//!
//! Mock collaborators and a temporary SQLite store, so command, scheduler
//! and gateway tests run without network access.
//!
//! # Components
//!
//! - [`MockAdapter`] - platform adapter that captures sends and can simulate blocks
//! - [`MockReportGenerator`] - deterministic report generator with injectable failures
//! - [`FailingStore`] - record store whose every operation fails
//! - [`StampFailingStore`] - real store whose `update_last_sent` fails for one subscriber
//! - [`TestHarness`] - temp-dir SQLite store with seeding helpers

pub mod failing_store;
pub mod harness;
pub mod mock_adapter;
pub mod mock_generator;

pub use failing_store::{FailingStore, StampFailingStore};
pub use harness::TestHarness;
pub use mock_adapter::{MockAdapter, SentMessage};
pub use mock_generator::MockReportGenerator;
