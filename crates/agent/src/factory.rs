//! Agent factory: select an architecture by name and configure it.
//!
//! ```ignore
//! let agent = create_agent("react")?
//!     .name("Researcher")
//!     .model("anthropic:claude-3-5-sonnet-latest")
//!     .router(router)
//!     .build()?;
//! let result = agent.run("Summarise the release notes").await?;
//! ```

use crate::architecture::Architecture;
use crate::engine::Agent;
use crate::llm::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, LlmClient};
use crate::options::{
    Aggregation, DEFAULT_MAX_ITERATIONS, LatOptions, RaiseOptions, ReasoningStyle, RewooOptions, ScratchPadFormat,
    SearchStrategy,
};
use crate::patterns::{BdiAgent, Evaluator, LatAgent, OodaAgent, RaiseAgent, ReactAgent, RewooAgent};
use crate::prompts::DEFAULT_DESCRIPTION;
use crate::run::AgentProfile;
use harkaam_config::AppConfig;
use harkaam_core::error::AgentError;
use harkaam_core::memory::Memory;
use harkaam_core::provider::Provider;
use harkaam_core::tool::{Tool, ToolRegistry};
use harkaam_memory::InMemoryStore;
use harkaam_providers::{ProviderRouter, build_from_config};
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Start building an agent of the named architecture.
pub fn create_agent(architecture: &str) -> Result<AgentBuilder, AgentError> {
    Ok(AgentBuilder::new(architecture.parse()?))
}

/// Builder for [`Agent`]. Settings that do not apply to the chosen
/// architecture are accepted and ignored.
#[derive(Clone)]
pub struct AgentBuilder {
    architecture: Architecture,
    name: Option<String>,
    description: Option<String>,
    system_prompt: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    tools: ToolRegistry,
    memory: Option<Arc<dyn Memory>>,
    verbose: bool,
    max_iterations: usize,
    lat: LatOptions,
    evaluator: Option<Arc<dyn Evaluator>>,
    rewoo: RewooOptions,
    raise: RaiseOptions,
    provider: Option<Arc<dyn Provider>>,
    router: Option<ProviderRouter>,
}

impl AgentBuilder {
    pub fn new(architecture: Architecture) -> Self {
        Self {
            architecture,
            name: None,
            description: None,
            system_prompt: None,
            model: DEFAULT_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            tools: ToolRegistry::new(),
            memory: None,
            verbose: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            lat: LatOptions::default(),
            evaluator: None,
            rewoo: RewooOptions::default(),
            raise: RaiseOptions::default(),
            provider: None,
            router: None,
        }
    }

    /// Apply configured defaults: model, sampling, verbosity, memory kind,
    /// architecture options and the provider router.
    pub fn from_config(mut self, config: &AppConfig) -> Result<Self, AgentError> {
        let agent = &config.agent;
        self.model = config.model_reference();
        self.temperature = config.default_temperature;
        self.max_tokens = config.default_max_tokens;
        self.verbose = config.verbose;
        self.max_iterations = agent.max_iterations;
        self.lat.max_depth = agent.max_depth;
        self.lat.max_branches = agent.max_branches;
        self.lat.search_strategy = agent.search_strategy.parse()?;
        self.rewoo.num_workers = agent.num_workers;
        self.rewoo.reasoning_depth = agent.reasoning_depth;
        self.rewoo.reasoning_style = agent.reasoning_style.parse()?;
        self.raise.format = agent.scratch_pad_format.parse()?;
        let memory = harkaam_memory::create_memory(&config.memory.kind, config.memory.max_messages)
            .map_err(|e| AgentError::InvalidConfig(e.to_string()))?;
        self.memory = Some(memory);
        self.router = Some(build_from_config(config));
        Ok(self)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Model reference: `provider:model` or a bare model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.lat.max_depth = depth;
        self
    }

    pub fn max_branches(mut self, branches: usize) -> Self {
        self.lat.max_branches = branches;
        self
    }

    pub fn search_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.lat.search_strategy = strategy;
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.lat.aggregation = aggregation;
        self
    }

    /// Replace the model-backed LAT evaluator.
    pub fn evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn num_workers(mut self, workers: usize) -> Self {
        self.rewoo.num_workers = workers;
        self
    }

    pub fn reasoning_depth(mut self, depth: usize) -> Self {
        self.rewoo.reasoning_depth = depth;
        self
    }

    pub fn reasoning_style(mut self, style: ReasoningStyle) -> Self {
        self.rewoo.reasoning_style = style;
        self
    }

    pub fn tree_branches(mut self, branches: usize) -> Self {
        self.rewoo.tree_branches = branches;
        self
    }

    pub fn examples(mut self, examples: Vec<String>) -> Self {
        self.raise.examples = examples;
        self
    }

    pub fn scratch_pad_format(mut self, format: ScratchPadFormat) -> Self {
        self.raise.format = format;
        self
    }

    /// Use this provider for every call, whatever the model prefix.
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Resolve the model reference through a router.
    pub fn router(mut self, router: ProviderRouter) -> Self {
        self.router = Some(router);
        self
    }

    fn validate(&self) -> Result<(), AgentError> {
        let invalid = |msg: &str| Err(AgentError::InvalidConfig(msg.to_string()));
        if self.model.trim().is_empty() {
            return invalid("model reference must not be empty");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return invalid("temperature must be between 0.0 and 2.0");
        }
        if self.max_tokens == 0 {
            return invalid("max_tokens must be greater than 0");
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations must be greater than 0");
        }
        match self.architecture {
            Architecture::Lat if self.lat.max_depth == 0 => invalid("max_depth must be greater than 0"),
            Architecture::Lat if self.lat.max_branches == 0 => invalid("max_branches must be greater than 0"),
            Architecture::Rewoo if self.rewoo.num_workers == 0 => invalid("num_workers must be greater than 0"),
            Architecture::Rewoo if self.rewoo.reasoning_depth == 0 => {
                invalid("reasoning_depth must be greater than 0")
            }
            Architecture::Rewoo if self.rewoo.tree_branches == 0 => invalid("tree_branches must be greater than 0"),
            _ => Ok(()),
        }
    }

    fn resolve_provider(&self) -> Result<(Arc<dyn Provider>, String), AgentError> {
        let reference = self.model.trim();
        if let Some(provider) = &self.provider {
            let model = match reference.split_once(':') {
                Some((prefix, model)) if prefix == provider.name() => model,
                _ => reference,
            };
            return Ok((provider.clone(), model.to_string()));
        }
        match &self.router {
            Some(router) => router
                .resolve(reference)
                .map_err(|e| AgentError::InvalidConfig(e.to_string())),
            None => Err(AgentError::InvalidConfig(
                "no provider configured; set a provider or a router".into(),
            )),
        }
    }

    pub fn build(self) -> Result<Agent, AgentError> {
        self.validate()?;
        let (provider, model) = self.resolve_provider()?;
        let llm = LlmClient::new(provider, model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let profile = AgentProfile {
            id: uuid::Uuid::new_v4().to_string(),
            name: self
                .name
                .unwrap_or_else(|| format!("{} Agent", self.architecture.title())),
            description: self.description.unwrap_or_else(|| DEFAULT_DESCRIPTION.into()),
            system_prompt: self.system_prompt,
            llm,
            tools: Arc::new(self.tools),
            memory: self.memory.unwrap_or_else(|| Arc::new(InMemoryStore::new())),
            verbose: self.verbose,
            max_iterations: self.max_iterations,
        };

        Ok(match self.architecture {
            Architecture::React => Agent::React(ReactAgent::new(profile)),
            Architecture::Ooda => Agent::Ooda(OodaAgent::new(profile)),
            Architecture::Bdi => Agent::Bdi(BdiAgent::new(profile)),
            Architecture::Lat => {
                let agent = LatAgent::new(profile, self.lat);
                Agent::Lat(match self.evaluator {
                    Some(evaluator) => agent.with_evaluator(evaluator),
                    None => agent,
                })
            }
            Architecture::Raise => Agent::Raise(RaiseAgent::new(profile, self.raise)),
            Architecture::Rewoo => Agent::Rewoo(RewooAgent::new(profile, self.rewoo)),
        })
    }
}

impl std::fmt::Debug for AgentBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentBuilder")
            .field("architecture", &self.architecture)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}
