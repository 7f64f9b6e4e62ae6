//! Configuration loading, validation, and management for Harkaam.
//!
//! Loads configuration from `~/.harkaam/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.harkaam/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Log every engine step at info level
    #[serde(default)]
    pub verbose: bool,

    /// Reasoning-engine defaults
    #[serde(default)]
    pub agent: AgentDefaults,

    /// Memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Workflow scheduler configuration
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("verbose", &self.verbose)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("workflow", &self.workflow)
            .field("providers", &self.providers)
            .finish()
    }
}

/// Per-provider connection settings.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (e.g. a local Ollama endpoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Defaults applied to agents created from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// LAT: deepest level of the search tree
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// LAT: continuations generated per expansion
    #[serde(default = "default_max_branches")]
    pub max_branches: usize,

    /// LAT: best_first | breadth_first | depth_first
    #[serde(default = "default_search_strategy")]
    pub search_strategy: String,

    /// ReWOO: subtasks produced by the planner
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// ReWOO: reasoning steps per worker
    #[serde(default = "default_reasoning_depth")]
    pub reasoning_depth: usize,

    /// ReWOO: chain_of_thought | tree_of_thought
    #[serde(default = "default_reasoning_style")]
    pub reasoning_style: String,

    /// RAISE: markdown | plain
    #[serde(default = "default_scratch_pad_format")]
    pub scratch_pad_format: String,
}

fn default_max_iterations() -> usize {
    10
}
fn default_max_depth() -> usize {
    5
}
fn default_max_branches() -> usize {
    3
}
fn default_search_strategy() -> String {
    "best_first".into()
}
fn default_num_workers() -> usize {
    3
}
fn default_reasoning_depth() -> usize {
    3
}
fn default_reasoning_style() -> String {
    "chain_of_thought".into()
}
fn default_scratch_pad_format() -> String {
    "markdown".into()
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_depth: default_max_depth(),
            max_branches: default_max_branches(),
            search_strategy: default_search_strategy(),
            num_workers: default_num_workers(),
            reasoning_depth: default_reasoning_depth(),
            reasoning_style: default_reasoning_style(),
            scratch_pad_format: default_scratch_pad_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// simple | conversation_buffer | none
    #[serde(default = "default_memory_kind")]
    pub kind: String,

    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

fn default_memory_kind() -> String {
    "simple".into()
}
fn default_max_messages() -> usize {
    100
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            kind: default_memory_kind(),
            max_messages: default_max_messages(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Maximum nodes running at once; 0 means no limit.
    #[serde(default)]
    pub max_parallel_nodes: usize,
}

impl AppConfig {
    /// Load configuration from the default path (~/.harkaam/config.toml).
    ///
    /// Environment overrides:
    /// - `HARKAAM_API_KEY` (highest priority), then `OPENAI_API_KEY`, then `ANTHROPIC_API_KEY`
    /// - `HARKAAM_OPENAI_API_KEY` / `HARKAAM_ANTHROPIC_API_KEY` for per-provider keys
    /// - `HARKAAM_PROVIDER`, `HARKAAM_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |e: std::io::Error| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(write_err)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("HARKAAM_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = var("OPENAI_API_KEY").or_else(|| var("ANTHROPIC_API_KEY"));
        }

        for provider in ["openai", "anthropic"] {
            let name = format!("HARKAAM_{}_API_KEY", provider.to_uppercase());
            if let Some(key) = var(&name) {
                self.providers.entry(provider.to_string()).or_default().api_key = Some(key);
            }
        }

        if let Some(provider) = var("HARKAAM_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = var("HARKAAM_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".harkaam")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.default_max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "default_max_tokens must be > 0".into(),
            ));
        }
        if self.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError("default_model must not be empty".into()));
        }

        let a = &self.agent;
        for (name, value) in [
            ("agent.max_iterations", a.max_iterations),
            ("agent.max_depth", a.max_depth),
            ("agent.max_branches", a.max_branches),
            ("agent.num_workers", a.num_workers),
            ("agent.reasoning_depth", a.reasoning_depth),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!("{name} must be > 0")));
            }
        }

        if self.memory.max_messages == 0 {
            return Err(ConfigError::ValidationError(
                "memory.max_messages must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// API key for a provider: its own section first, then the global key.
    pub fn api_key_for(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// The default model as a `provider:model` reference.
    pub fn model_reference(&self) -> String {
        format!("{}:{}", self.default_provider, self.default_model)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            verbose: false,
            agent: AgentDefaults::default(),
            memory: MemoryConfig::default(),
            workflow: WorkflowConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert!((config.default_temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.default_max_tokens, 1000);
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.agent.max_depth, 5);
        assert_eq!(config.agent.max_branches, 3);
        assert_eq!(config.agent.search_strategy, "best_first");
        assert_eq!(config.agent.num_workers, 3);
        assert_eq!(config.agent.reasoning_style, "chain_of_thought");
        assert_eq!(config.memory.max_messages, 100);
        assert_eq!(config.workflow.max_parallel_nodes, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, config.default_model);
        assert_eq!(parsed.agent.reasoning_depth, config.agent.reasoning_depth);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_bounds_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_branches = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("agent.max_branches"));

        let config = AppConfig {
            default_max_tokens: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "default_model = \"claude-3-5-sonnet-latest\"\n\n[agent]\nmax_depth = 2\n",
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "claude-3-5-sonnet-latest");
        assert_eq!(config.agent.max_depth, 2);
        assert_eq!(config.agent.max_branches, 3);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_temperature = \"hot\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.workflow.max_parallel_nodes = 4;
        config.save_to(&path).unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.workflow.max_parallel_nodes, 4);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-openai"),
            ("HARKAAM_ANTHROPIC_API_KEY", "sk-ant"),
            ("HARKAAM_MODEL", "gpt-4o-mini"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.api_key_for("anthropic").as_deref(), Some("sk-ant"));
        assert_eq!(config.api_key_for("openai").as_deref(), Some("sk-openai"));
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.model_reference(), "openai:gpt-4o-mini");
    }

    #[test]
    fn debug_redacts_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o"));
        assert!(toml_str.contains("[agent]"));
    }
}
