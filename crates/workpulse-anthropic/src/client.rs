// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Handles authentication headers, request construction and a single retry
//! on transient statuses (429, 500, 503, 529).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};
use workpulse_core::WorkpulseError;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

const MESSAGES_PATH: &str = "/v1/messages";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl AnthropicClient {
    pub fn new(api_key: &str, api_version: &str, base_url: &str) -> Result<Self, WorkpulseError> {
        Self::with_timeout(api_key, api_version, base_url, REQUEST_TIMEOUT)
    }

    /// Like [`AnthropicClient::new`] with a custom whole-request timeout.
    pub fn with_timeout(
        api_key: &str,
        api_version: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, WorkpulseError> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(api_key)
            .map_err(|e| WorkpulseError::Config(format!("invalid API key header value: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                WorkpulseError::Config(format!("invalid API version header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| WorkpulseError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            url: format!("{}{MESSAGES_PATH}", base_url.trim_end_matches('/')),
            timeout,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Send a non-streaming request and return the full response.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, WorkpulseError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.url)
                .json(request)
                .send()
                .await
                .map_err(|e| self.transport_error("HTTP request failed", e))?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let body = response
                    .text()
                    .await
                    .map_err(|e| self.transport_error("failed to read response body", e))?;
                return serde_json::from_str(&body).map_err(|e| WorkpulseError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                attempt += 1;
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Anthropic API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(WorkpulseError::Provider {
                message,
                source: None,
            });
        }
    }

    /// Whole-request timeouts surface as [`WorkpulseError::Timeout`].
    fn transport_error(&self, context: &str, e: reqwest::Error) -> WorkpulseError {
        if e.is_timeout() {
            return WorkpulseError::Timeout {
                duration: self.timeout,
            };
        }
        WorkpulseError::Provider {
            message: format!("{context}: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}
