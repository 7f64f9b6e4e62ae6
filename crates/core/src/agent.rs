//! Agent run state and result types.
//!
//! An `AgentState` is created fresh at the start of every run, mutated as the
//! engine steps, and frozen into the `AgentResult` it produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::tool::ToolInvocation;

/// Where an engine currently is in its loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    Thinking,
    Acting,
    Observing,
    Done,
    Failed,
}

/// What kind of step a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Thought,
    Action,
    Observation,
    Orientation,
    Decision,
    Belief,
    Desire,
    Intention,
    Plan,
    Expansion,
    Evaluation,
    Worker,
    Synthesis,
    FinalAnswer,
}

impl StepKind {
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::Thought => "Thought",
            StepKind::Action => "Action",
            StepKind::Observation => "Observation",
            StepKind::Orientation => "Orientation",
            StepKind::Decision => "Decision",
            StepKind::Belief => "Beliefs",
            StepKind::Desire => "Desires",
            StepKind::Intention => "Intentions",
            StepKind::Plan => "Plan",
            StepKind::Expansion => "Expansion",
            StepKind::Evaluation => "Evaluation",
            StepKind::Worker => "Worker",
            StepKind::Synthesis => "Synthesis",
            StepKind::FinalAnswer => "Final Answer",
        }
    }
}

/// One completed step of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub kind: StepKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolInvocation>,
}

/// Progress of a single agent run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub stage: Stage,

    /// Number of completed steps; always equal to `history.len()`.
    pub step_count: usize,

    /// Run-scoped facts, seeded by the caller.
    pub context: Map<String, Value>,

    /// Strategy-private scratch.
    pub working_memory: Map<String, Value>,

    pub history: Vec<StepRecord>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: Map<String, Value>) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    /// Append a completed step.
    pub fn record(&mut self, kind: StepKind, content: impl Into<String>) -> &StepRecord {
        self.push(StepRecord {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            tool: None,
        })
    }

    /// Append a completed act step together with its tool invocation.
    pub fn record_tool(&mut self, kind: StepKind, content: impl Into<String>, invocation: ToolInvocation) -> &StepRecord {
        self.push(StepRecord {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            tool: Some(invocation),
        })
    }

    fn push(&mut self, step: StepRecord) -> &StepRecord {
        self.history.push(step);
        self.step_count += 1;
        &self.history[self.history.len() - 1]
    }

    /// Content of the most recent step of the given kind.
    pub fn last_of(&self, kind: StepKind) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|s| s.kind == kind)
            .map(|s| s.content.as_str())
    }

    pub fn remember(&mut self, key: impl Into<String>, value: Value) {
        self.working_memory.insert(key.into(), value);
    }
}

/// The outcome of one agent run. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_id: String,
    pub output: String,
    pub intermediate_steps: Vec<StepRecord>,
    pub final_state: AgentState,
    pub metadata: Map<String, Value>,
}

impl AgentResult {
    /// Freeze a state into a result. The step list mirrors the state history.
    pub fn new(agent_id: impl Into<String>, output: impl Into<String>, state: AgentState, metadata: Map<String, Value>) -> Self {
        Self {
            agent_id: agent_id.into(),
            output: output.into(),
            intermediate_steps: state.history.clone(),
            final_state: state,
            metadata,
        }
    }

    /// Whether the run stopped at its iteration or depth bound.
    pub fn is_truncated(&self) -> bool {
        self.metadata
            .get("truncated")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn architecture(&self) -> &str {
        self.metadata
            .get("architecture")
            .and_then(Value::as_str)
            .unwrap_or("agent")
    }

    /// Human-readable report of the run.
    pub fn render(&self, verbose: bool) -> String {
        let mut out = format!("=== {} result ===\n\n", self.architecture().to_uppercase());
        out.push_str(&format!("Answer: {}\n", self.output));
        if verbose && !self.intermediate_steps.is_empty() {
            out.push_str("\nThinking process:\n");
            for (i, step) in self.intermediate_steps.iter().enumerate() {
                out.push_str(&format!("{}. {}: {}\n", i + 1, step.kind.label(), step.content));
                if let Some(tool) = &step.tool {
                    out.push_str(&format!("   -> {}({}) = {}\n", tool.tool_name, tool.input, tool.observation()));
                }
            }
        }
        out.push_str(&format!("\nSteps: {}", self.final_state.step_count));
        if self.is_truncated() {
            out.push_str(" (truncated)");
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_starts_idle() {
        let state = AgentState::new();
        assert_eq!(state.stage, Stage::Idle);
        assert_eq!(state.step_count, 0);
        assert!(state.history.is_empty());
    }

    #[test]
    fn record_keeps_count_in_step_with_history() {
        let mut state = AgentState::new();
        state.record(StepKind::Thought, "a");
        state.record(StepKind::Observation, "b");
        assert_eq!(state.step_count, 2);
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.last_of(StepKind::Thought), Some("a"));
        assert_eq!(state.last_of(StepKind::Plan), None);
    }

    #[test]
    fn result_mirrors_history() {
        let mut state = AgentState::new();
        state.record(StepKind::Thought, "think");
        state.record(StepKind::FinalAnswer, "42");
        let result = AgentResult::new("a1", "42", state, Map::new());
        assert_eq!(result.intermediate_steps.len(), result.final_state.history.len());
        assert!(!result.is_truncated());
    }

    #[test]
    fn render_includes_steps_when_verbose() {
        let mut state = AgentState::new();
        state.record(StepKind::Thought, "consider");
        let mut meta = Map::new();
        meta.insert("architecture".into(), json!("react"));
        meta.insert("truncated".into(), json!(true));
        let result = AgentResult::new("a1", "done", state, meta);

        let quiet = result.render(false);
        assert!(quiet.contains("=== REACT result ==="));
        assert!(quiet.contains("Answer: done"));
        assert!(!quiet.contains("Thinking process"));
        assert!(quiet.contains("(truncated)"));

        let loud = result.render(true);
        assert!(loud.contains("1. Thought: consider"));
    }
}
