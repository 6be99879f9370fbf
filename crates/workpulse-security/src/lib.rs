// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook authentication for Workpulse.
//!
//! Two verifiers share one stage model ([`VerificationStage`]):
//! - [`SignedRequestVerifier`]: timestamped HMAC-SHA256 signatures with a
//!   replay window (Slack).
//! - [`SharedSecretVerifier`]: a static secret header that fails closed in
//!   production (Telegram).

pub mod shared_secret;
pub mod signed;
pub mod verification;

pub use shared_secret::SharedSecretVerifier;
pub use signed::SignedRequestVerifier;
pub use verification::{RejectReason, Rejection, VerificationStage, constant_time_eq};
