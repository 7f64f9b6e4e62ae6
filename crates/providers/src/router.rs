//! Provider router: resolves `provider:model` references to a backend.

use std::collections::HashMap;
use std::sync::Arc;
use harkaam_core::error::ProviderError;
use harkaam_core::provider::Provider;
use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Routes model references to the correct provider.
#[derive(Clone)]
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Resolve `provider:model` (or a bare model) to a provider and model name.
    ///
    /// The prefix only counts as a provider when one is registered under
    /// that name, so Ollama-style tags like `llama3:8b` stay intact.
    pub fn resolve(&self, reference: &str) -> Result<(Arc<dyn Provider>, String), ProviderError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ProviderError::ModelNotFound("empty model reference".into()));
        }
        if let Some((prefix, model)) = reference.split_once(':')
            && let Some(provider) = self.get(prefix)
        {
            if model.is_empty() {
                return Err(ProviderError::ModelNotFound(reference.to_string()));
            }
            return Ok((provider, model.to_string()));
        }
        self.default_provider()
            .map(|p| (p, reference.to_string()))
            .ok_or_else(|| ProviderError::NotConfigured(self.default_provider.clone()))
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &harkaam_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = config.api_key_for(name).unwrap_or_default();
        router.register(name.clone(), make_provider(name, &api_key, provider_config.api_url.as_deref()));
    }

    // Well-known providers are always addressable by prefix.
    for name in ["openai", "anthropic", config.default_provider.as_str()] {
        if router.get(name).is_none() {
            let api_key = config.api_key_for(name).unwrap_or_default();
            router.register(name.to_string(), make_provider(name, &api_key, None));
        }
    }

    router
}

fn make_provider(name: &str, api_key: &str, api_url: Option<&str>) -> Arc<dyn Provider> {
    if name == "anthropic" {
        let mut p = AnthropicProvider::new(api_key);
        if let Some(url) = api_url {
            p = p.with_base_url(url);
        }
        Arc::new(p)
    } else {
        let base_url = api_url.map(String::from).unwrap_or_else(|| default_base_url(name));
        Arc::new(OpenAiCompatProvider::new(name, base_url, api_key))
    }
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> ProviderRouter {
        let mut router = ProviderRouter::new("openai");
        router.register("openai", Arc::new(OpenAiCompatProvider::openai("sk-test")));
        router.register("anthropic", Arc::new(AnthropicProvider::new("sk-ant")));
        router
    }

    #[test]
    fn resolves_prefixed_reference() {
        let (provider, model) = router().resolve("anthropic:claude-3-5-sonnet-latest").unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(model, "claude-3-5-sonnet-latest");
    }

    #[test]
    fn bare_model_uses_default() {
        let (provider, model) = router().resolve("gpt-4o").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(model, "gpt-4o");
    }

    #[test]
    fn unknown_prefix_is_part_of_model() {
        let (provider, model) = router().resolve("llama3:8b").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(model, "llama3:8b");
    }

    #[test]
    fn empty_references_rejected() {
        assert!(router().resolve("  ").is_err());
        assert!(router().resolve("openai:").is_err());
        assert!(ProviderRouter::new("none").resolve("gpt-4o").is_err());
    }

    #[test]
    fn build_from_default_config() {
        let config = harkaam_config::AppConfig::default();
        let router = build_from_config(&config);
        assert!(router.default_provider().is_some());
        assert_eq!(router.list(), vec!["anthropic", "openai"]);
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }
}
