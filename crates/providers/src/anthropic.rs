//! Anthropic native provider implementation.
//!
//! Uses the Messages API directly: `x-api-key` authentication, an
//! `anthropic-version` header, and the system prompt as a top-level field.

use async_trait::async_trait;
use harkaam_core::error::ProviderError;
use harkaam_core::message::{Message, Role};
use harkaam_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::http;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: http::client(),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Split system messages off into the top-level `system` field.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let (system, rest): (Vec<&Message>, Vec<&Message>) =
            messages.iter().partition(|m| m.role == Role::System);
        let system = if system.is_empty() {
            None
        } else {
            Some(
                system
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            )
        };
        (system, rest)
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let (system, messages) = Self::extract_system(&request.messages);
        let messages: Vec<AnthropicMessage> = messages
            .into_iter()
            .map(|m| AnthropicMessage {
                role: if m.role == Role::Assistant { "assistant" } else { "user" }.into(),
                content: m.content.clone(),
            })
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": request.temperature.min(1.0),
        });
        if let Some(system) = system {
            body["system"] = serde_json::json!(system);
        }
        if !request.stop.is_empty() {
            body["stop_sequences"] = serde_json::json!(request.stop);
        }
        body
    }

    fn into_response(api: AnthropicResponse) -> ProviderResponse {
        let text = api
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        let response = ProviderResponse::text(api.model, text);
        match api.usage {
            Some(u) => response.with_usage(u.input_tokens, u.output_tokens),
            None => response,
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(provider = "anthropic", model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&Self::request_body(&request))
            .send()
            .await
            .map_err(http::send_error)?;

        let response = http::check_status("anthropic", response).await?;
        let api: AnthropicResponse = response.json().await.map_err(http::parse_error)?;
        Ok(Self::into_response(api))
    }
}

// ── Wire types ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_extraction() {
        let messages = vec![
            Message::system("You are helpful"),
            Message::user("Hello"),
            Message::system("Be concise"),
        ];
        let (system, rest) = AnthropicProvider::extract_system(&messages);
        assert_eq!(system.as_deref(), Some("You are helpful\n\nBe concise"));
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].role, Role::User);
    }

    #[test]
    fn request_body_clamps_temperature() {
        let mut request = ProviderRequest::new("claude-3-5-sonnet-latest", vec![Message::user("hi")]);
        request.temperature = 1.6;
        let body = AnthropicProvider::request_body(&request);
        assert_eq!(body["temperature"], 1.0);
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn joins_text_blocks() {
        let raw = r#"{
            "model": "claude-3-5-sonnet-latest",
            "content": [{"type": "text", "text": "Final "}, {"type": "text", "text": "Answer: yes"}],
            "usage": {"input_tokens": 7, "output_tokens": 4}
        }"#;
        let api: AnthropicResponse = serde_json::from_str(raw).unwrap();
        let response = AnthropicProvider::into_response(api);
        assert_eq!(response.message.content, "Final Answer: yes");
        assert_eq!(response.usage.unwrap().total_tokens, 11);
    }
}
