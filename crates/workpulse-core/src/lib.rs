// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Workpulse.
//!
//! This crate provides the platform-agnostic data model, the error type and
//! the trait seams (platform adapters, record store, report generation and
//! command handling) that every other Workpulse crate builds on.

pub mod command;
pub mod delivery;
pub mod error;
pub mod registry;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use delivery::deliver;
pub use error::WorkpulseError;
pub use registry::{PlatformRegistry, RegisteredPlatform};
pub use types::{
    Action, HealthStatus, NormalizedUpdate, ParseMode, Platform, ReportItem, RuntimeMode,
    SendOptions, StructuredReport, Subscriber, WebhookRequest, WebhookResponse, WorkEntry,
};

pub use traits::{
    CommandHandler, CommandReply, PlatformAdapter, ReportFormatter, ReportGenerator,
    SubscriberStore,
};
