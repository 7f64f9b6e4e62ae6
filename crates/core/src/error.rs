//! Error types for the Harkaam domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Harkaam operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Agent run errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Workflow errors ---
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures of a single agent run.
///
/// Hitting an iteration or depth bound is not an error: the run returns a
/// truncated `AgentResult` instead.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Generation failed during {step}: {source}")]
    Generation {
        step: String,
        #[source]
        source: ProviderError,
    },

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Invalid agent configuration: {0}")]
    InvalidConfig(String),

    #[error("No output produced by {0}")]
    EmptyOutput(String),

    #[error("All {attempted} workers failed")]
    AllWorkersFailed { attempted: usize },
}

impl AgentError {
    /// Wrap a provider failure with the name of the step that issued the call.
    pub fn generation(step: impl Into<String>, source: ProviderError) -> Self {
        Self::Generation {
            step: step.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    #[error("Adding dependency '{dependency}' to node '{node}' would create a cycle")]
    CyclicDependency { node: String, dependency: String },

    #[error("Node '{node}' depends on unknown node '{dependency}'")]
    UnknownDependency { node: String, dependency: String },

    #[error("Node id already in use: {0}")]
    DuplicateNode(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Workflow execution failed (failed: {}; stalled: {})", format_failed(.failed), .stalled.join(", "))]
    Execution {
        /// Nodes whose agent returned an error, with the error text.
        failed: Vec<(String, String)>,
        /// Nodes that never became ready.
        stalled: Vec<String>,
    },
}

fn format_failed(failed: &[(String, String)]) -> String {
    failed
        .iter()
        .map(|(id, reason)| format!("{id} ({reason})"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn generation_error_names_step() {
        let err = AgentError::generation("thought", ProviderError::Network("reset".into()));
        let text = err.to_string();
        assert!(text.contains("thought"));
        assert!(text.contains("reset"));
    }

    #[test]
    fn execution_error_lists_stalled_nodes() {
        let err = WorkflowError::Execution {
            failed: vec![("fetch".into(), "boom".into())],
            stalled: vec!["summarize".into(), "publish".into()],
        };
        let text = err.to_string();
        assert!(text.contains("fetch (boom)"));
        assert!(text.contains("summarize, publish"));
    }

    #[test]
    fn agent_error_converts_into_top_level() {
        fn fails() -> Result<()> {
            Err(AgentError::InvalidTask("empty".into()))?
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, Error::Agent(AgentError::InvalidTask(_))));
        assert_eq!(err.to_string(), "Agent error: Invalid task: empty");
    }

    #[test]
    fn workflow_error_converts_into_top_level() {
        let err: Error = WorkflowError::UnknownNode("x".into()).into();
        assert!(matches!(err, Error::Workflow(WorkflowError::UnknownNode(_))));
    }
}
