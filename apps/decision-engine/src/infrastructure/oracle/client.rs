//! OpenAI-compatible chat client for the decision oracle.
//!
//! One request per cycle, no retry: a timed-out or malformed response is
//! cycle-fatal by design, so there is nothing useful to retry into.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::schema::validate_proposal;
use crate::application::ports::{OracleError, OraclePort};
use crate::models::OracleProposal;

/// Oracle endpoint configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Base URL of the OpenAI-compatible API (no trailing slash).
    pub api_base: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Client-side request timeout. The orchestrator applies its own hard
    /// timeout on top; this one makes sure no orphaned request outlives it.
    pub timeout: Duration,
}

/// System message framing the oracle's role.
const SYSTEM_PROMPT: &str = "You are a disciplined quantitative trading assistant. \
You only answer with the exact JSON object requested, with no markdown fences or prose.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// [`OraclePort`] adapter over an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct ChatOracleAdapter {
    client: reqwest::Client,
    config: OracleConfig,
}

impl ChatOracleAdapter {
    /// Create a new adapter.
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl OraclePort for ChatOracleAdapter {
    async fn propose(&self, prompt: &str) -> Result<OracleProposal, OracleError> {
        let url = format!("{}/chat/completions", self.config.api_base);
        let body = json!({
            "model": self.config.model,
            "temperature": 0.2,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout {
                        seconds: self.config.timeout.as_secs(),
                    }
                } else {
                    OracleError::Transport {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OracleError::Transport {
                message: format!("HTTP {status}: {text}"),
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| OracleError::Transport {
            message: format!("response decode failed: {e}"),
        })?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| OracleError::Schema {
                message: "response carried no choices".to_string(),
            })?;

        let raw = extract_json(content).map_err(|message| OracleError::Schema { message })?;
        validate_proposal(&raw)
    }
}

/// Extract the JSON object from the model's message content.
///
/// Models wrap output in markdown fences often enough that this tolerates
/// them, but it never repairs the JSON itself.
fn extract_json(content: &str) -> Result<serde_json::Value, String> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map_or(trimmed, |rest| rest.trim_end_matches("```"));

    serde_json::from_str(body.trim()).map_err(|e| format!("content is not valid JSON: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_body(content: &str) -> serde_json::Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    fn oracle_json() -> String {
        json!({
            "reasoning": "range-bound",
            "decisions": [{
                "symbol": "BTC",
                "operation": "HOLD",
                "prediction": {
                    "direction": "SIDEWAYS", "confidence": 0.6,
                    "support": 49000, "resistance": 52000, "analysis": "chop"
                },
                "rationale": "no edge"
            }]
        })
        .to_string()
    }

    async fn adapter_for(server: &MockServer) -> ChatOracleAdapter {
        ChatOracleAdapter::new(OracleConfig {
            api_base: server.uri(),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn parses_clean_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&oracle_json())))
            .mount(&server)
            .await;

        let proposal = adapter_for(&server).await.propose("prompt").await.unwrap();
        assert_eq!(proposal.decisions.len(), 1);
        assert_eq!(proposal.reasoning.as_deref(), Some("range-bound"));
    }

    #[tokio::test]
    async fn tolerates_markdown_fences() {
        let server = MockServer::start().await;
        let fenced = format!("```json\n{}\n```", oracle_json());
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&fenced)))
            .mount(&server)
            .await;

        let proposal = adapter_for(&server).await.propose("prompt").await.unwrap();
        assert_eq!(proposal.decisions.len(), 1);
    }

    #[tokio::test]
    async fn non_json_content_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("I would buy BTC.")))
            .mount(&server)
            .await;

        let err = adapter_for(&server).await.propose("prompt").await.unwrap_err();
        assert!(matches!(err, OracleError::Schema { .. }));
    }

    #[tokio::test]
    async fn http_error_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = adapter_for(&server).await.propose("prompt").await.unwrap_err();
        assert!(matches!(err, OracleError::Transport { .. }));
    }

    #[test]
    fn extract_json_plain_and_fenced() {
        assert!(extract_json("{\"a\":1}").is_ok());
        assert!(extract_json("```json\n{\"a\":1}\n```").is_ok());
        assert!(extract_json("```\n{\"a\":1}\n```").is_ok());
        assert!(extract_json("not json").is_err());
    }
}
