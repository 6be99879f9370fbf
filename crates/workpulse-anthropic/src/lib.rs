// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report generator backed by the Anthropic Messages API.
//!
//! The model is asked for a JSON object with `completed`, `incomplete` and
//! `planned` lists, or `{"error": "<reason>"}` when the text is not a work
//! update. Any other reply is a provider error.

pub mod client;
pub mod types;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use workpulse_config::AnthropicConfig;
use workpulse_core::{ReportGenerator, StructuredReport, WorkpulseError};

pub use client::AnthropicClient;

use crate::types::{ApiMessage, MessageRequest};

const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const SYSTEM_PROMPT: &str = r#"You turn a person's free-text work update into a daily summary.
Reply with a single JSON object and nothing else, in exactly this shape:
{"completed": [{"project": "...", "task": "..."}], "incomplete": [...], "planned": [...]}
- completed: work finished today
- incomplete: work started but not finished
- planned: work intended for the next day
Use a short project name; use "general" when none is given. Lists may be empty.
If the text is not a work update, reply with {"error": "<short reason>"}."#;

const BRIEF_INSTRUCTION: &str = "Keep each task to a short phrase.";
const VERBOSE_INSTRUCTION: &str =
    "Describe each task in one or two full sentences and keep relevant details such as ticket numbers.";

/// Either a report or an explicit refusal.
#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratorReply {
    Report(StructuredReport),
    Refusal { error: String },
}

#[derive(Debug)]
pub struct AnthropicReportGenerator {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicReportGenerator {
    /// `anthropic.api_key` wins over the `ANTHROPIC_API_KEY` environment variable.
    pub fn new(config: &AnthropicConfig) -> Result<Self, WorkpulseError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| {
                WorkpulseError::Config(format!(
                    "anthropic.api_key or {API_KEY_ENV} is required for report generation"
                ))
            })?;
        Ok(Self {
            client: AnthropicClient::new(&api_key, &config.api_version, &config.base_url)?,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn build_request(&self, text: &str, verbose: bool) -> MessageRequest {
        let (instruction, max_tokens) = if verbose {
            (VERBOSE_INSTRUCTION, self.max_tokens.saturating_mul(2))
        } else {
            (BRIEF_INSTRUCTION, self.max_tokens)
        };
        MessageRequest {
            model: self.model.clone(),
            max_tokens,
            system: format!("{SYSTEM_PROMPT}\n{instruction}"),
            messages: vec![ApiMessage::user(text)],
        }
    }
}

#[async_trait]
impl ReportGenerator for AnthropicReportGenerator {
    async fn generate(
        &self,
        text: &str,
        verbose: bool,
    ) -> Result<StructuredReport, WorkpulseError> {
        let response = self
            .client
            .complete_message(&self.build_request(text, verbose))
            .await?;
        debug!(
            id = %response.id,
            stop_reason = response.stop_reason.as_deref().unwrap_or("unknown"),
            "report generated"
        );
        parse_report(&response.text())
    }
}

/// Parse the model's reply. Markdown code fences around the JSON are tolerated.
pub fn parse_report(raw: &str) -> Result<StructuredReport, WorkpulseError> {
    let json = strip_code_fence(raw);
    match serde_json::from_str::<GeneratorReply>(json) {
        Ok(GeneratorReply::Report(report)) => Ok(report),
        Ok(GeneratorReply::Refusal { error }) => {
            warn!(reason = %error, "generator declined to produce a report");
            Err(WorkpulseError::Provider {
                message: format!("generator declined: {error}"),
                source: None,
            })
        }
        Err(e) => Err(WorkpulseError::Provider {
            message: "generator reply is not a report".into(),
            source: Some(Box::new(e)),
        }),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use workpulse_core::ReportItem;

    use super::*;

    const REPORT_JSON: &str = r#"{"completed":[{"project":"api","task":"fixed login"}],"incomplete":[],"planned":[{"project":"docs","task":"write guide"}]}"#;

    fn generator(base: &str) -> AnthropicReportGenerator {
        AnthropicReportGenerator::new(&AnthropicConfig {
            api_key: Some("test-key".into()),
            base_url: base.to_string(),
            model: "claude-test".into(),
            max_tokens: 512,
            ..Default::default()
        })
        .unwrap()
    }

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 20}
        }))
    }

    #[test]
    fn parses_plain_json() {
        let report = parse_report(REPORT_JSON).unwrap();
        assert_eq!(report.completed, vec![ReportItem::new("api", "fixed login")]);
        assert!(report.incomplete.is_empty());
        assert_eq!(report.planned.len(), 1);
    }

    #[test]
    fn parses_fenced_json() {
        let fenced = format!("```json\n{REPORT_JSON}\n```\n");
        assert_eq!(parse_report(&fenced).unwrap(), parse_report(REPORT_JSON).unwrap());
    }

    #[test]
    fn refusal_is_provider_error() {
        let err = parse_report(r#"{"error": "not a work update"}"#).unwrap_err();
        assert!(matches!(err, WorkpulseError::Provider { .. }));
        assert!(err.to_string().contains("not a work update"));
    }

    #[test]
    fn other_shapes_are_provider_errors() {
        for raw in [
            "Sure! Here is your summary.",
            r#"{"completed": []}"#,
            r#"{"completed": "x", "incomplete": [], "planned": []}"#,
            "[]",
            "",
        ] {
            assert!(
                matches!(parse_report(raw), Err(WorkpulseError::Provider { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn missing_api_key_is_config_error() {
        // Only meaningful when the variable is not set in the test environment.
        if std::env::var(API_KEY_ENV).is_ok() {
            return;
        }
        let err = AnthropicReportGenerator::new(&AnthropicConfig::default()).unwrap_err();
        assert!(matches!(err, WorkpulseError::Config(_)));
    }

    #[test]
    fn verbose_doubles_token_budget() {
        let generator = generator("http://localhost");
        assert_eq!(generator.build_request("x", false).max_tokens, 512);
        let verbose = generator.build_request("x", true);
        assert_eq!(verbose.max_tokens, 1024);
        assert!(verbose.system.contains(VERBOSE_INSTRUCTION));
    }

    #[tokio::test]
    async fn generate_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(json!({
                "model": "claude-test",
                "messages": [{"role": "user", "content": "fixed login, next: docs"}]
            })))
            .respond_with(reply(&format!("```json\n{REPORT_JSON}\n```")))
            .expect(1)
            .mount(&server)
            .await;

        let report = generator(&server.uri())
            .generate("fixed login, next: docs", false)
            .await
            .unwrap();
        assert_eq!(report.completed[0].project, "api");
    }

    #[tokio::test]
    async fn malformed_reply_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("I cannot help with that."))
            .mount(&server)
            .await;

        let err = generator(&server.uri())
            .generate("hello", false)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkpulseError::Provider { .. }));
    }
}
