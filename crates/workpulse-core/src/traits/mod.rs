// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the platform-agnostic core and its collaborators.
//!
//! All traits use `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` and injected at startup.

pub mod adapter;
pub mod command;
pub mod report;
pub mod store;

pub use adapter::PlatformAdapter;
pub use command::{CommandHandler, CommandReply};
pub use report::{ReportFormatter, ReportGenerator};
pub use store::SubscriberStore;
