//! Per-agent settings and the per-run tracker every engine drives.

use crate::architecture::Architecture;
use crate::llm::LlmClient;
use crate::parser::ToolCall;
use crate::prompts;
use harkaam_core::agent::{AgentResult, AgentState, Stage, StepKind};
use harkaam_core::error::AgentError;
use harkaam_core::memory::Memory;
use harkaam_core::tool::{ToolInvocation, ToolRegistry};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings shared by all architectures.
#[derive(Clone)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_prompt: Option<String>,
    pub llm: LlmClient,
    pub tools: Arc<ToolRegistry>,
    pub memory: Arc<dyn Memory>,
    pub verbose: bool,
    /// Loop bound for iterative architectures.
    pub max_iterations: usize,
}

impl std::fmt::Debug for AgentProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("llm", &self.llm)
            .field("tools", &self.tools)
            .field("memory", &self.memory.name())
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

/// Why a run stopped without a terminal answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    IterationLimit,
    DepthLimit,
}

impl Truncation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Truncation::IterationLimit => "iteration_limit_exceeded",
            Truncation::DepthLimit => "depth_limit_exceeded",
        }
    }
}

/// State of one `run` call: a fresh `AgentState`, the memory it writes to
/// and the metadata it will hand back.
pub(crate) struct Run<'a> {
    pub profile: &'a AgentProfile,
    pub architecture: Architecture,
    pub task: String,
    pub system: String,
    pub state: AgentState,
    memory: Arc<dyn Memory>,
    metadata: Map<String, Value>,
}

impl<'a> Run<'a> {
    pub fn start(
        profile: &'a AgentProfile,
        architecture: Architecture,
        task: &str,
        context: Map<String, Value>,
        memory: Arc<dyn Memory>,
    ) -> Self {
        let mut state = AgentState::with_context(context);
        state.remember("task", json!(task));
        let system = prompts::system_prompt(
            &profile.name,
            &profile.description,
            profile.system_prompt.as_deref(),
            architecture,
        );
        info!(
            architecture = architecture.as_str(),
            agent = %profile.name,
            model = profile.llm.model(),
            "Run starting"
        );
        Self {
            profile,
            architecture,
            task: task.to_string(),
            system,
            state,
            memory,
            metadata: Map::new(),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.profile.tools
    }

    /// `Task:` line plus the context block, the common head of every prompt.
    pub fn task_header(&self) -> String {
        format!(
            "Task: {}\n\n{}",
            self.task,
            prompts::context_block(&self.state.context)
        )
    }

    /// One generation call. The stage is `Thinking` while it runs.
    pub async fn generate(&mut self, step: &str, prompt: &str) -> Result<String, AgentError> {
        self.state.set_stage(Stage::Thinking);
        match self.profile.llm.generate(step, &self.system, prompt).await {
            Ok(text) => Ok(text),
            Err(e) => {
                self.state.set_stage(Stage::Failed);
                warn!(architecture = self.architecture.as_str(), step, error = %e, "Generation failed");
                Err(e)
            }
        }
    }

    /// Record a completed step.
    pub fn step(&mut self, kind: StepKind, content: impl Into<String>) {
        let content = content.into();
        self.log_step(kind, &content);
        self.state.record(kind, content);
    }

    fn log_step(&self, kind: StepKind, content: &str) {
        let n = self.state.step_count + 1;
        if self.profile.verbose {
            info!(architecture = self.architecture.as_str(), step = n, kind = kind.label(), "{content}");
        } else {
            debug!(architecture = self.architecture.as_str(), step = n, kind = kind.label(), "{content}");
        }
    }

    /// Invoke a tool and record the act step.
    ///
    /// Tool failures come back as an error invocation; they never end the run.
    pub async fn act(&mut self, call: &ToolCall) -> ToolInvocation {
        self.state.set_stage(Stage::Acting);
        let invocation = self.profile.tools.invoke(&call.name, &call.parameter).await;
        if invocation.is_error() {
            warn!(tool = %call.name, observation = %invocation.observation(), "Tool call failed");
        }
        self.record_invocation(invocation.clone()).await;
        self.state.set_stage(Stage::Observing);
        invocation
    }

    /// Record an invocation made elsewhere (e.g. by a ReWOO worker).
    pub async fn record_invocation(&mut self, invocation: ToolInvocation) {
        let content = format!("{}: {}", invocation.tool_name, invocation.input);
        self.log_step(StepKind::Action, &content);
        self.state.record_tool(StepKind::Action, content, invocation.clone());
        let key = format!("step_{}_tool", self.state.step_count);
        match serde_json::to_value(&invocation) {
            Ok(value) => self.persist(&key, value).await,
            Err(e) => warn!(key = %key, error = %e, "Could not serialize tool invocation"),
        }
    }

    /// Write to the run's memory. Failures are logged, not propagated.
    pub async fn persist(&self, key: &str, value: Value) {
        if let Err(e) = self.memory.add(key, value).await {
            warn!(memory = self.memory.name(), key, error = %e, "Memory write failed");
        }
    }

    pub fn meta(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }

    fn into_result(mut self, output: String) -> AgentResult {
        self.state.set_stage(Stage::Done);
        self.metadata
            .insert("architecture".into(), json!(self.architecture.as_str()));
        self.metadata
            .insert("steps".into(), json!(self.state.step_count));
        self.metadata
            .entry("truncated")
            .or_insert(Value::Bool(false));
        AgentResult::new(self.profile.id.clone(), output, self.state, self.metadata)
    }

    /// Terminal answer reached.
    pub fn finish(self, output: impl Into<String>) -> AgentResult {
        info!(
            architecture = self.architecture.as_str(),
            steps = self.state.step_count,
            "Run finished"
        );
        self.into_result(output.into())
    }

    /// Bound reached first: return the best partial answer.
    pub fn truncate(mut self, output: impl Into<String>, reason: Truncation) -> AgentResult {
        warn!(
            architecture = self.architecture.as_str(),
            steps = self.state.step_count,
            reason = reason.as_str(),
            "Run truncated"
        );
        self.meta("truncated", Value::Bool(true));
        self.meta("truncation", json!(reason.as_str()));
        self.into_result(output.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::{SequentialMockProvider, test_profile};
    use harkaam_memory::InMemoryStore;

    #[tokio::test]
    async fn act_records_and_persists_invocation() {
        let profile = test_profile(Arc::new(SequentialMockProvider::from_texts(&[])));
        let memory = Arc::new(InMemoryStore::new());
        let mut run = Run::start(&profile, Architecture::React, "add", Map::new(), memory.clone());

        let call = ToolCall { name: "calculator".into(), parameter: "2 + 3".into() };
        let invocation = run.act(&call).await;
        assert_eq!(invocation.observation(), "5");
        assert_eq!(run.state.stage, Stage::Observing);
        assert_eq!(run.state.step_count, 1);

        let stored = memory.get("step_1_tool").await.unwrap().unwrap();
        assert_eq!(stored["tool_name"], "calculator");
        assert_eq!(stored["output"], "5");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_observation_not_an_error() {
        let profile = test_profile(Arc::new(SequentialMockProvider::from_texts(&[])));
        let mut run = Run::start(&profile, Architecture::React, "t", Map::new(), profile.memory.clone());
        let invocation = run
            .act(&ToolCall { name: "search".into(), parameter: "x".into() })
            .await;
        assert!(invocation.is_error());
        assert!(invocation.observation().starts_with("Error:"));
    }

    #[tokio::test]
    async fn truncate_flags_metadata() {
        let profile = test_profile(Arc::new(SequentialMockProvider::from_texts(&[])));
        let mut run = Run::start(&profile, Architecture::Ooda, "t", Map::new(), profile.memory.clone());
        run.step(StepKind::Thought, "partial");
        let result = run.truncate("partial", Truncation::IterationLimit);
        assert!(result.is_truncated());
        assert_eq!(result.metadata["truncation"], "iteration_limit_exceeded");
        assert_eq!(result.metadata["architecture"], "ooda");
        assert_eq!(result.final_state.stage, Stage::Done);
        assert_eq!(result.final_state.working_memory["task"], "t");
    }
}
