//! Workflow nodes and the values they produce.

use harkaam_agent::Agent;
use harkaam_core::agent::AgentResult;
use harkaam_core::memory::Memory;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Results key holding the value passed to `execute`.
pub const INPUT_KEY: &str = "input";

/// Everything produced so far in one execution, keyed by node id.
pub type WorkflowResults = BTreeMap<String, NodeOutput>;

pub type ConditionFn = dyn Fn(&WorkflowResults) -> bool + Send + Sync;
pub type InputTransform = dyn Fn(&WorkflowResults) -> Map<String, Value> + Send + Sync;
pub type OutputTransform = dyn Fn(AgentResult) -> NodeOutput + Send + Sync;

/// What a node left in the results map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum NodeOutput {
    /// The external input under [`INPUT_KEY`].
    Input(Value),

    /// The agent's result, untransformed.
    Agent(Box<AgentResult>),

    /// Whatever a `transform_output` hook returned.
    Value(Value),

    /// The node's condition was false; its agent never ran.
    Skipped,
}

impl NodeOutput {
    pub fn agent(result: AgentResult) -> Self {
        NodeOutput::Agent(Box::new(result))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, NodeOutput::Skipped)
    }

    pub fn as_agent_result(&self) -> Option<&AgentResult> {
        match self {
            NodeOutput::Agent(result) => Some(result),
            _ => None,
        }
    }

    /// The compact form placed into a dependent's run context: the answer
    /// text for agent results, the raw value otherwise, `null` when skipped.
    pub fn to_value(&self) -> Value {
        match self {
            NodeOutput::Input(value) | NodeOutput::Value(value) => value.clone(),
            NodeOutput::Agent(result) => Value::String(result.output.clone()),
            NodeOutput::Skipped => Value::Null,
        }
    }
}

/// The default node input: every result so far, in compact form.
pub fn results_as_context(results: &WorkflowResults) -> Map<String, Value> {
    results.iter().map(|(id, output)| (id.clone(), output.to_value())).collect()
}

/// A node to be added to a [`WorkflowGraph`](crate::WorkflowGraph).
///
/// ```ignore
/// let summarize = NodeSpec::new(agent.clone(), "summarize")
///     .description("Summarize the findings")
///     .depends_on(&research_id)
///     .condition(|results| !results[&research_id].is_skipped());
/// ```
#[derive(Clone)]
pub struct NodeSpec {
    pub(crate) id: String,
    pub(crate) agent: Arc<Agent>,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) dependencies: Vec<String>,
    pub(crate) condition: Option<Arc<ConditionFn>>,
    pub(crate) transform_input: Option<Arc<InputTransform>>,
    pub(crate) transform_output: Option<Arc<OutputTransform>>,
    pub(crate) memory: Option<Arc<dyn Memory>>,
}

impl NodeSpec {
    pub fn new(agent: Arc<Agent>, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent,
            name: name.into(),
            description: String::new(),
            dependencies: Vec::new(),
            condition: None,
            transform_input: None,
            transform_output: None,
            memory: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on(mut self, node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        if !self.dependencies.contains(&node_id) {
            self.dependencies.push(node_id);
        }
        self
    }

    /// Run the node only when `condition` holds for the results so far.
    pub fn condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&WorkflowResults) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Build the agent's run context from the results so far.
    pub fn transform_input<F>(mut self, transform: F) -> Self
    where
        F: Fn(&WorkflowResults) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.transform_input = Some(Arc::new(transform));
        self
    }

    pub fn transform_output<F>(mut self, transform: F) -> Self
    where
        F: Fn(AgentResult) -> NodeOutput + Send + Sync + 'static,
    {
        self.transform_output = Some(Arc::new(transform));
        self
    }

    /// Give the node its own memory instead of a fresh store per execution.
    pub fn with_memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    /// Task text handed to the agent.
    pub fn task(&self) -> String {
        match (self.name.trim().is_empty(), self.description.trim().is_empty()) {
            (true, true) => format!("Execute task for node {}", self.id),
            (false, true) => self.name.clone(),
            (true, false) => self.description.clone(),
            (false, false) => format!("{}: {}", self.name, self.description),
        }
    }

    pub(crate) fn is_ready(&self, results: &WorkflowResults) -> bool {
        self.dependencies.iter().all(|dep| results.contains_key(dep))
    }

    pub(crate) fn should_run(&self, results: &WorkflowResults) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition(results))
    }

    pub(crate) fn input_for(&self, results: &WorkflowResults) -> Map<String, Value> {
        match &self.transform_input {
            Some(transform) => transform(results),
            None => results_as_context(results),
        }
    }

    pub(crate) fn output_from(&self, result: AgentResult) -> NodeOutput {
        match &self.transform_output {
            Some(transform) => transform(result),
            None => NodeOutput::agent(result),
        }
    }
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("agent", &self.agent.name())
            .field("dependencies", &self.dependencies)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skipped_output_is_null_in_context() {
        let mut results = WorkflowResults::new();
        results.insert(INPUT_KEY.into(), NodeOutput::Input(json!({"topic": "rust"})));
        results.insert("a".into(), NodeOutput::Skipped);
        results.insert("b".into(), NodeOutput::Value(json!(42)));

        let context = results_as_context(&results);
        assert_eq!(context["input"], json!({"topic": "rust"}));
        assert_eq!(context["a"], Value::Null);
        assert_eq!(context["b"], json!(42));
    }

    #[test]
    fn node_output_serializes_with_status_tag() {
        let value = serde_json::to_value(NodeOutput::Skipped).unwrap();
        assert_eq!(value, json!({"status": "skipped"}));

        let value = serde_json::to_value(NodeOutput::Value(json!("x"))).unwrap();
        assert_eq!(value, json!({"status": "value", "value": "x"}));
    }
}
