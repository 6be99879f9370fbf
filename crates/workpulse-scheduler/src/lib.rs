// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily summary scheduling.
//!
//! [`FanOutJob`] performs one run over every active subscriber;
//! [`Scheduler`] fires it on a cron schedule and never lets two runs overlap.

pub mod job;
pub mod trigger;

pub use job::{FanOutJob, RunSummary};
pub use trigger::Scheduler;
