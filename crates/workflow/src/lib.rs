//! Agent workflows for Harkaam.
//!
//! A [`WorkflowGraph`] wraps agents in nodes joined by dependency edges.
//! `execute` runs independent nodes concurrently, feeds each node the
//! results of everything before it, and returns every node's output keyed
//! by node id.

pub mod graph;
pub mod node;

pub use graph::WorkflowGraph;
pub use node::{INPUT_KEY, NodeOutput, NodeSpec, WorkflowResults, results_as_context};
