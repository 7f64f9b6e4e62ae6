//! Reasoning engines for Harkaam.
//!
//! An [`Agent`] turns a task into a sequence of think/act/observe steps and
//! a final answer, using one of six architectures:
//!
//! - **ReAct**: thought, tool call, observation, repeated
//! - **OODA**: observe, orient, decide, act cycles
//! - **BDI**: beliefs, desires and intentions driving actions
//! - **LAT**: tree search over scored candidate continuations
//! - **RAISE**: reasoning on a scratch pad persisted to memory
//! - **ReWOO**: one plan, parallel workers, one solver call
//!
//! Every run starts from a fresh `AgentState` and returns an `AgentResult`.
//! Hitting an iteration or depth bound is not an error: the result comes
//! back with `metadata.truncated = true`.

pub mod architecture;
pub mod engine;
pub mod factory;
pub mod llm;
pub mod options;
pub mod parser;
pub mod patterns;
pub mod prompts;
pub mod run;

pub use architecture::Architecture;
pub use engine::Agent;
pub use factory::{AgentBuilder, create_agent};
pub use llm::LlmClient;
pub use options::{
    Aggregation, LatOptions, RaiseOptions, ReasoningStyle, RewooOptions, ScratchPadFormat, SearchStrategy,
};
pub use patterns::{Evaluator, FnEvaluator, LlmEvaluator};
pub use run::{AgentProfile, Truncation};
