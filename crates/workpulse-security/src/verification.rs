// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Verification stages and rejection reasons shared by both verifiers.

use thiserror::Error;
use workpulse_core::{Platform, WorkpulseError};

/// Progress of an inbound request through verification.
///
/// `Unchecked -> HeadersPresent -> TimestampFresh -> SignatureValid -> Accepted`.
/// Shared-secret verification has no timestamp and skips `TimestampFresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerificationStage {
    Unchecked,
    HeadersPresent,
    TimestampFresh,
    SignatureValid,
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// No secret is configured and the mode does not allow that.
    NotConfigured,
    MissingHeader(&'static str),
    MalformedTimestamp,
    /// Timestamp outside the tolerance window, in seconds from now.
    StaleTimestamp { skew_secs: u64 },
    SignatureMismatch,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NotConfigured => f.write_str("no webhook secret configured"),
            RejectReason::MissingHeader(name) => write!(f, "missing header {name}"),
            RejectReason::MalformedTimestamp => f.write_str("malformed timestamp"),
            RejectReason::StaleTimestamp { skew_secs } => {
                write!(f, "timestamp {skew_secs}s outside tolerance")
            }
            RejectReason::SignatureMismatch => f.write_str("signature mismatch"),
        }
    }
}

/// A failed verification: where it stopped and why.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rejected at {stage:?}: {reason}")]
pub struct Rejection {
    pub stage: VerificationStage,
    pub reason: RejectReason,
}

impl Rejection {
    pub(crate) fn at(stage: VerificationStage, reason: RejectReason) -> Self {
        Self { stage, reason }
    }

    /// The error an adapter reports for a webhook that failed verification.
    pub fn into_error(self, platform: Platform) -> WorkpulseError {
        WorkpulseError::Authentication {
            platform,
            reason: self.to_string(),
        }
    }
}

/// Compare two byte strings without early exit on the first difference.
///
/// Lengths are compared first; equal-length inputs are XOR-accumulated over
/// every byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    diff == 0
}
