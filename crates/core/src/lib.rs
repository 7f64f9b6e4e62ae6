//! # Harkaam Core
//!
//! Domain types, traits and errors shared by every Harkaam crate: the
//! `Provider`, `Tool` and `Memory` seams a reasoning engine talks through,
//! and the `AgentState`/`AgentResult` records a run produces.
//!
//! Implementations live in their own crates and depend inward on this one.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod memory;
pub mod agent;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, Error, MemoryError, ProviderError, Result, ToolError, WorkflowError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{FunctionTool, ParameterType, Tool, ToolInvocation, ToolOutcome, ToolParameter, ToolRegistry, ToolResult};
pub use memory::{ConversationMemory, Memory};
pub use agent::{AgentResult, AgentState, Stage, StepKind, StepRecord};
