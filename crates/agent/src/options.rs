//! Architecture-specific options and their defaults.

use harkaam_core::error::AgentError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_MAX_BRANCHES: usize = 3;
pub const DEFAULT_NUM_WORKERS: usize = 3;
pub const DEFAULT_REASONING_DEPTH: usize = 3;
pub const DEFAULT_TREE_BRANCHES: usize = 2;

fn normalized(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Order in which LAT picks the next node to expand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    #[default]
    BestFirst,
    BreadthFirst,
    DepthFirst,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::BestFirst => "best_first",
            SearchStrategy::BreadthFirst => "breadth_first",
            SearchStrategy::DepthFirst => "depth_first",
        }
    }
}

impl FromStr for SearchStrategy {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s).as_str() {
            "best_first" | "best" => Ok(Self::BestFirst),
            "breadth_first" | "bfs" => Ok(Self::BreadthFirst),
            "depth_first" | "dfs" => Ok(Self::DepthFirst),
            other => Err(AgentError::InvalidConfig(format!("unknown search strategy: {other}"))),
        }
    }
}

/// How a LAT node's value is derived from its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Max,
    Mean,
}

impl Aggregation {
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(match self {
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
        })
    }
}

impl FromStr for Aggregation {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s).as_str() {
            "max" => Ok(Self::Max),
            "mean" | "avg" | "average" => Ok(Self::Mean),
            other => Err(AgentError::InvalidConfig(format!("unknown aggregation: {other}"))),
        }
    }
}

/// How a ReWOO worker reasons through its subtask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningStyle {
    #[default]
    ChainOfThought,
    TreeOfThought,
}

impl ReasoningStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningStyle::ChainOfThought => "chain_of_thought",
            ReasoningStyle::TreeOfThought => "tree_of_thought",
        }
    }
}

impl FromStr for ReasoningStyle {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s).as_str() {
            "chain_of_thought" | "cot" => Ok(Self::ChainOfThought),
            "tree_of_thought" | "tot" => Ok(Self::TreeOfThought),
            other => Err(AgentError::InvalidConfig(format!("unknown reasoning style: {other}"))),
        }
    }
}

/// Rendering of the RAISE scratch pad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScratchPadFormat {
    #[default]
    Markdown,
    Plain,
}

impl FromStr for ScratchPadFormat {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s).as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "plain" | "plain_text" | "text" => Ok(Self::Plain),
            other => Err(AgentError::InvalidConfig(format!("unknown scratch pad format: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatOptions {
    pub max_depth: usize,
    pub max_branches: usize,
    pub search_strategy: SearchStrategy,
    pub aggregation: Aggregation,
}

impl Default for LatOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_branches: DEFAULT_MAX_BRANCHES,
            search_strategy: SearchStrategy::default(),
            aggregation: Aggregation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewooOptions {
    pub num_workers: usize,
    pub reasoning_depth: usize,
    pub reasoning_style: ReasoningStyle,
    /// Candidates per level when reasoning tree-of-thought style.
    pub tree_branches: usize,
}

impl Default for RewooOptions {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_NUM_WORKERS,
            reasoning_depth: DEFAULT_REASONING_DEPTH,
            reasoning_style: ReasoningStyle::default(),
            tree_branches: DEFAULT_TREE_BRANCHES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaiseOptions {
    /// Worked solutions seeded into the scratch pad.
    pub examples: Vec<String>,
    pub format: ScratchPadFormat,
}
