//! Generation adapter shared by every engine.

use harkaam_core::error::AgentError;
use harkaam_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// A provider bound to one model and its sampling parameters.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate text for one named step of a run.
    ///
    /// Provider failures become [`AgentError::Generation`] tagged with `step`.
    pub async fn generate(&self, step: &str, system: &str, prompt: &str) -> Result<String, AgentError> {
        let request =
            ProviderRequest::prompt(self.model.clone(), system, prompt).with_sampling(self.temperature, self.max_tokens);

        debug!(provider = self.provider.name(), model = %self.model, step, "Generating");
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| AgentError::generation(step, e))?;
        Ok(response.content().trim().to_string())
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::{FnProvider, failing_provider};

    #[tokio::test]
    async fn sends_system_and_user_messages() {
        let provider = Arc::new(FnProvider::new(|req| {
            assert_eq!(req.messages.len(), 2);
            assert_eq!(req.max_tokens, Some(256));
            assert!((req.temperature - 0.2).abs() < f32::EPSILON);
            Ok(format!("  echo: {}  ", req.messages[1].content))
        }));
        let llm = LlmClient::new(provider.clone(), "mock-model")
            .with_temperature(0.2)
            .with_max_tokens(256);
        let text = llm.generate("thought", "system", "hello").await.unwrap();
        assert_eq!(text, "echo: hello");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn provider_failure_names_the_step() {
        let llm = LlmClient::new(Arc::new(failing_provider()), "mock-model");
        let err = llm.generate("orient", "s", "p").await.unwrap_err();
        match err {
            AgentError::Generation { step, .. } => assert_eq!(step, "orient"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
