// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared-secret header verification (Telegram webhook secret token).
//!
//! Fails closed: in production mode a missing secret rejects every request.
//! Only development mode may run without one.

use workpulse_core::{RuntimeMode, WebhookRequest, WorkpulseError};

use crate::verification::{RejectReason, Rejection, VerificationStage, constant_time_eq};

pub const TELEGRAM_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct SharedSecretVerifier {
    secret: Option<String>,
    mode: RuntimeMode,
    header: &'static str,
}

impl SharedSecretVerifier {
    pub fn telegram(secret: Option<String>, mode: RuntimeMode) -> Self {
        let verifier = Self {
            secret: secret.filter(|s| !s.is_empty()),
            mode,
            header: TELEGRAM_SECRET_HEADER,
        };
        if verifier.secret.is_none() {
            match mode {
                RuntimeMode::Production => tracing::error!(
                    header = TELEGRAM_SECRET_HEADER,
                    "no webhook secret configured, rejecting all inbound requests"
                ),
                RuntimeMode::Development => tracing::warn!(
                    header = TELEGRAM_SECRET_HEADER,
                    "no webhook secret configured, accepting unauthenticated requests (development mode)"
                ),
            }
        }
        verifier
    }

    /// Startup check: refuse to run in production without a secret.
    pub fn ensure_configured(&self) -> Result<(), WorkpulseError> {
        if self.secret.is_none() && self.mode == RuntimeMode::Production {
            return Err(WorkpulseError::Config(format!(
                "a webhook secret for {} is required in production mode",
                self.header
            )));
        }
        Ok(())
    }

    pub fn verify_request(&self, request: &WebhookRequest) -> Result<(), Rejection> {
        self.verify(request.header(self.header))
    }

    pub fn verify(&self, provided: Option<&str>) -> Result<(), Rejection> {
        let stage = VerificationStage::Unchecked;
        let Some(secret) = self.secret.as_deref() else {
            return match self.mode {
                RuntimeMode::Development => Ok(()),
                RuntimeMode::Production => {
                    Err(Rejection::at(stage, RejectReason::NotConfigured))
                }
            };
        };

        let Some(provided) = provided else {
            return Err(Rejection::at(stage, RejectReason::MissingHeader(self.header)));
        };

        let stage = VerificationStage::HeadersPresent;
        if !constant_time_eq(secret.as_bytes(), provided.as_bytes()) {
            return Err(Rejection::at(stage, RejectReason::SignatureMismatch));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SharedSecretVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("mode", &self.mode)
            .field("header", &self.header)
            .finish()
    }
}
