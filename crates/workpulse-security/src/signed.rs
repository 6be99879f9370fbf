// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HMAC-signed request verification (Slack signing scheme).
//!
//! The platform sends a unix timestamp and `v0=<hex>` where the hex digest is
//! HMAC-SHA256 over `v0:{timestamp}:{raw body}` keyed by the signing secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use workpulse_core::WebhookRequest;

use crate::verification::{RejectReason, Rejection, VerificationStage, constant_time_eq};

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted clock skew between the platform and us.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

const VERSION: &str = "v0";

pub const SLACK_TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SLACK_SIGNATURE_HEADER: &str = "x-slack-signature";

#[derive(Clone)]
pub struct SignedRequestVerifier {
    secret: Option<String>,
    tolerance_secs: u64,
    timestamp_header: &'static str,
    signature_header: &'static str,
}

impl SignedRequestVerifier {
    /// Verifier for Slack's `X-Slack-Request-Timestamp` / `X-Slack-Signature` headers.
    pub fn slack(signing_secret: Option<String>) -> Self {
        Self {
            secret: signing_secret.filter(|s| !s.is_empty()),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
            timestamp_header: SLACK_TIMESTAMP_HEADER,
            signature_header: SLACK_SIGNATURE_HEADER,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: u64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Compute `v0=<hex>` for a timestamp and body. `None` without a secret.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Option<String> {
        compute_signature(self.secret.as_deref()?, timestamp, body)
    }

    /// Verify a request against the current wall clock.
    pub fn verify_request(&self, request: &WebhookRequest, now_unix: i64) -> Result<(), Rejection> {
        self.verify(
            request.header(self.timestamp_header),
            request.header(self.signature_header),
            &request.body,
            now_unix,
        )
    }

    /// Walk the verification stages. Only an `Ok` lets the body be parsed.
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now_unix: i64,
    ) -> Result<(), Rejection> {
        let stage = VerificationStage::Unchecked;
        let Some(secret) = self.secret.as_deref() else {
            return Err(Rejection::at(stage, RejectReason::NotConfigured));
        };
        let Some(timestamp) = timestamp else {
            return Err(Rejection::at(
                stage,
                RejectReason::MissingHeader(self.timestamp_header),
            ));
        };
        let Some(signature) = signature else {
            return Err(Rejection::at(
                stage,
                RejectReason::MissingHeader(self.signature_header),
            ));
        };

        let stage = VerificationStage::HeadersPresent;
        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| Rejection::at(stage, RejectReason::MalformedTimestamp))?;
        let skew_secs = now_unix.abs_diff(sent_at);
        if skew_secs > self.tolerance_secs {
            return Err(Rejection::at(
                stage,
                RejectReason::StaleTimestamp { skew_secs },
            ));
        }

        let stage = VerificationStage::TimestampFresh;
        let expected = compute_signature(secret, timestamp, body).unwrap_or_default();
        if expected.is_empty() || !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(Rejection::at(stage, RejectReason::SignatureMismatch));
        }

        tracing::trace!(stage = ?VerificationStage::SignatureValid, "signed request verified");
        Ok(())
    }
}

impl std::fmt::Debug for SignedRequestVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedRequestVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

fn compute_signature(secret: &str, timestamp: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Some(format!("{VERSION}={}", hex::encode(mac.finalize().into_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const NOW: i64 = 1_760_000_000;
    const BODY: &[u8] = b"token=xyz&command=%2Fworkpulse&text=status";

    fn verifier() -> SignedRequestVerifier {
        SignedRequestVerifier::slack(Some(SECRET.to_string()))
    }

    fn signed_at(ts: i64) -> (String, String) {
        let ts = ts.to_string();
        let sig = verifier().sign(&ts, BODY).unwrap();
        (ts, sig)
    }

    #[test]
    fn matches_documented_slack_example() {
        // Example from Slack's request-signing documentation.
        let v = SignedRequestVerifier::slack(Some("8f742231b10e8888abcd99yyyzzz85a5".into()));
        let body = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";
        assert_eq!(
            v.sign("1531420618", body).unwrap(),
            "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503"
        );
    }

    #[test]
    fn accepts_fresh_valid_signature() {
        let (ts, sig) = signed_at(NOW - 10);
        assert!(verifier().verify(Some(&ts), Some(&sig), BODY, NOW).is_ok());
    }

    #[test]
    fn accepts_exactly_at_tolerance() {
        let (ts, sig) = signed_at(NOW - 300);
        assert!(verifier().verify(Some(&ts), Some(&sig), BODY, NOW).is_ok());
    }

    #[test]
    fn rejects_one_second_past_tolerance() {
        let (ts, sig) = signed_at(NOW - 301);
        let err = verifier()
            .verify(Some(&ts), Some(&sig), BODY, NOW)
            .unwrap_err();
        assert_eq!(err.stage, VerificationStage::HeadersPresent);
        assert_eq!(err.reason, RejectReason::StaleTimestamp { skew_secs: 301 });
    }

    #[test]
    fn rejects_future_timestamp_past_tolerance() {
        let (ts, sig) = signed_at(NOW + 301);
        assert!(verifier().verify(Some(&ts), Some(&sig), BODY, NOW).is_err());
    }

    #[test]
    fn rejects_every_single_bit_mutation_of_signature() {
        let (ts, sig) = signed_at(NOW);
        let bytes = sig.as_bytes();
        for i in 0..bytes.len() {
            for bit in 0..8 {
                let mut mutated = bytes.to_vec();
                mutated[i] ^= 1 << bit;
                let Ok(mutated) = String::from_utf8(mutated) else {
                    continue;
                };
                let err = verifier()
                    .verify(Some(&ts), Some(&mutated), BODY, NOW)
                    .unwrap_err();
                assert_eq!(err.reason, RejectReason::SignatureMismatch);
                assert_eq!(err.stage, VerificationStage::TimestampFresh);
            }
        }
    }

    #[test]
    fn rejects_tampered_body() {
        let (ts, sig) = signed_at(NOW);
        let err = verifier()
            .verify(Some(&ts), Some(&sig), b"token=xyz&command=%2Fworkpulse&text=help", NOW)
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::SignatureMismatch);
    }

    #[test]
    fn rejects_missing_headers() {
        let (ts, sig) = signed_at(NOW);
        let err = verifier().verify(None, Some(&sig), BODY, NOW).unwrap_err();
        assert_eq!(err.stage, VerificationStage::Unchecked);
        assert_eq!(
            err.reason,
            RejectReason::MissingHeader(SLACK_TIMESTAMP_HEADER)
        );
        assert!(verifier().verify(Some(&ts), None, BODY, NOW).is_err());
    }

    #[test]
    fn rejects_without_secret() {
        let (ts, sig) = signed_at(NOW);
        let v = SignedRequestVerifier::slack(None);
        let err = v.verify(Some(&ts), Some(&sig), BODY, NOW).unwrap_err();
        assert_eq!(err.reason, RejectReason::NotConfigured);

        let empty = SignedRequestVerifier::slack(Some(String::new()));
        assert!(empty.verify(Some(&ts), Some(&sig), BODY, NOW).is_err());
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let (_, sig) = signed_at(NOW);
        let err = verifier()
            .verify(Some("yesterday"), Some(&sig), BODY, NOW)
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::MalformedTimestamp);
    }

    #[test]
    fn verify_request_reads_headers_case_insensitively() {
        let (ts, sig) = signed_at(NOW);
        let request = WebhookRequest::new(BODY.to_vec())
            .with_header("X-Slack-Request-Timestamp", ts)
            .with_header("X-Slack-Signature", sig);
        assert!(verifier().verify_request(&request, NOW).is_ok());
    }

    #[test]
    fn debug_redacts_secret() {
        assert!(!format!("{:?}", verifier()).contains(SECRET));
    }
}
