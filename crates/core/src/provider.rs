//! The generation service seen by reasoning engines.
//!
//! Engines make one kind of call: a system prompt and a user prompt in,
//! generated text out. [`Provider`] is the seam; the providers crate holds
//! the HTTP backends and tests script their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Backend model name, without any `provider:` prefix.
    pub model: String,

    pub messages: Vec<Message>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl ProviderRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            stop: Vec::new(),
        }
    }

    /// The system + user pair every engine step sends.
    pub fn prompt(model: impl Into<String>, system: &str, user: &str) -> Self {
        Self::new(model, vec![Message::system(system), Message::user(user)])
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Content of the last user message.
    pub fn user_prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::message::Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// What came back from one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub message: Message,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Model that answered; backends may substitute a dated snapshot.
    pub model: String,
}

impl ProviderResponse {
    /// A plain assistant reply with no usage accounting.
    pub fn text(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(text),
            usage: None,
            model: model.into(),
        }
    }

    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.usage = Some(Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        });
        self
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Short backend name, e.g. "openai" or "anthropic".
    fn name(&self) -> &str;

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}
