//! LAT pattern: language agent tree search.
//!
//! The search tree lives in an arena (`Vec<TreeNode>` indexed by node id).
//! Expanding a node generates up to `max_branches` candidate continuations
//! concurrently, scores each with an [`Evaluator`], and propagates values up
//! to the root. The search ends once some candidate carries the final-answer
//! marker, or when every open node sits at `max_depth`.

use crate::architecture::Architecture;
use crate::llm::LlmClient;
use crate::options::{Aggregation, LatOptions, SearchStrategy};
use crate::parser;
use crate::run::{AgentProfile, Run, Truncation};
use async_trait::async_trait;
use futures::future::join_all;
use harkaam_core::agent::{AgentResult, Stage, StepKind};
use harkaam_core::error::AgentError;
use harkaam_core::memory::Memory;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Scores a candidate continuation in `[0, 1]`.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, task: &str, trajectory: &str, candidate: &str) -> Result<f64, AgentError>;
}

const EVALUATOR_SYSTEM: &str = "You are a strict reviewer of partial solutions. \
     Judge how likely a proposed step is to lead to a correct, complete answer.";

/// Asks the model for a score. Unreadable replies score zero.
#[derive(Debug, Clone)]
pub struct LlmEvaluator {
    llm: LlmClient,
}

impl LlmEvaluator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate(&self, task: &str, trajectory: &str, candidate: &str) -> Result<f64, AgentError> {
        let prompt = format!(
            "Task: {task}\n\nPartial solution so far:\n{trajectory}\n\nProposed next step:\n{candidate}\n\n\
             Rate how promising this step is on a scale from 0 to 10. Reply with \"Score: N\"."
        );
        let reply = self.llm.generate("evaluation", EVALUATOR_SYSTEM, &prompt).await?;
        Ok(parser::parse_score(&reply).unwrap_or_else(|| {
            debug!(reply = %reply, "Unreadable evaluation, scoring 0");
            0.0
        }))
    }
}

type ScoreFn = dyn Fn(&str) -> f64 + Send + Sync;

/// Scores candidates with a plain function of the candidate text.
pub struct FnEvaluator {
    func: Box<ScoreFn>,
}

impl FnEvaluator {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&str) -> f64 + Send + Sync + 'static,
    {
        Self { func: Box::new(func) }
    }
}

#[async_trait]
impl Evaluator for FnEvaluator {
    async fn evaluate(&self, _task: &str, _trajectory: &str, candidate: &str) -> Result<f64, AgentError> {
        Ok((self.func)(candidate).clamp(0.0, 1.0))
    }
}

// ── Search tree ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: usize,
    pub parent: Option<usize>,
    pub depth: usize,
    pub content: String,
    /// The evaluator's score for this node.
    pub score: f64,
    /// Aggregated value: the score for leaves, aggregated child values otherwise.
    pub value: f64,
    pub children: Vec<usize>,
    pub terminal: bool,
    pub expanded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl SearchTree {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            nodes: vec![TreeNode {
                id: 0,
                parent: None,
                depth: 0,
                content: root.into(),
                score: 0.0,
                value: 0.0,
                children: Vec::new(),
                terminal: false,
                expanded: false,
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: usize) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn add_child(&mut self, parent: usize, content: impl Into<String>, score: f64, terminal: bool) -> usize {
        let id = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(TreeNode {
            id,
            parent: Some(parent),
            depth,
            content: content.into(),
            score,
            value: score,
            children: Vec::new(),
            terminal,
            expanded: false,
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn mark_expanded(&mut self, id: usize) {
        self.nodes[id].expanded = true;
    }

    /// Recompute values from `id` up to the root.
    pub fn backpropagate(&mut self, id: usize, aggregation: Aggregation) {
        let mut current = Some(id);
        while let Some(n) = current {
            let values: Vec<f64> = self.nodes[n]
                .children
                .iter()
                .map(|&c| self.nodes[c].value)
                .collect();
            if let Some(v) = aggregation.apply(&values) {
                self.nodes[n].value = v;
            }
            current = self.nodes[n].parent;
        }
    }

    /// Next node to expand, or `None` when the frontier is exhausted.
    ///
    /// Ties always go to the earliest-created node.
    pub fn next_open(&self, strategy: SearchStrategy, max_depth: usize) -> Option<usize> {
        let open = self
            .nodes
            .iter()
            .filter(|n| !n.expanded && !n.terminal && n.depth < max_depth);
        let mut best: Option<&TreeNode> = None;
        for node in open {
            let better = match best {
                None => true,
                Some(b) => match strategy {
                    SearchStrategy::BestFirst => node.value > b.value,
                    SearchStrategy::BreadthFirst => node.depth < b.depth,
                    SearchStrategy::DepthFirst => node.depth > b.depth,
                },
            };
            if better {
                best = Some(node);
            }
        }
        best.map(|n| n.id)
    }

    /// Node ids from the root down to `id`.
    pub fn path(&self, id: usize) -> Vec<usize> {
        let mut path = vec![id];
        let mut current = self.nodes[id].parent;
        while let Some(p) = current {
            path.push(p);
            current = self.nodes[p].parent;
        }
        path.reverse();
        path
    }

    /// Numbered steps below the root on the way to `id`.
    pub fn trajectory(&self, id: usize) -> String {
        let steps: Vec<String> = self
            .path(id)
            .into_iter()
            .skip(1)
            .enumerate()
            .map(|(i, n)| format!("{}. {}", i + 1, self.nodes[n].content))
            .collect();
        if steps.is_empty() {
            "(nothing yet)".to_string()
        } else {
            steps.join("\n")
        }
    }

    fn best_by(&self, pred: impl Fn(&TreeNode) -> bool) -> Option<usize> {
        let mut best: Option<&TreeNode> = None;
        for node in self.nodes.iter().filter(|n| pred(n)) {
            if best.is_none_or(|b| node.score > b.score) {
                best = Some(node);
            }
        }
        best.map(|n| n.id)
    }

    /// Highest-scoring terminal node.
    pub fn best_terminal(&self) -> Option<usize> {
        self.best_by(|n| n.terminal)
    }

    /// Highest-scoring node other than the root.
    pub fn best_partial(&self) -> Option<usize> {
        self.best_by(|n| n.parent.is_some())
    }
}

// ── Agent ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct LatAgent {
    profile: AgentProfile,
    options: LatOptions,
    evaluator: Arc<dyn Evaluator>,
}

impl std::fmt::Debug for LatAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatAgent")
            .field("profile", &self.profile)
            .field("options", &self.options)
            .finish()
    }
}

struct Candidate {
    branch: usize,
    content: String,
    score: f64,
}

impl LatAgent {
    /// A LAT agent scoring candidates with the profile's own model.
    pub(crate) fn new(profile: AgentProfile, options: LatOptions) -> Self {
        let evaluator = Arc::new(LlmEvaluator::new(profile.llm.clone()));
        Self {
            profile,
            options,
            evaluator,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn options(&self) -> &LatOptions {
        &self.options
    }

    async fn propose(&self, run: &Run<'_>, trajectory: &str, branch: usize) -> Result<Candidate, AgentError> {
        let prompt = format!(
            "{}Partial solution so far:\n{trajectory}\n\nPropose candidate {} of {} for the next step. \
             Make it different from the other candidates.",
            run.task_header(),
            branch + 1,
            self.options.max_branches,
        );
        let content = self.profile.llm.generate("expansion", &run.system, &prompt).await?;
        let score = self.evaluator.evaluate(&run.task, trajectory, &content).await?;
        Ok(Candidate { branch, content, score })
    }

    /// Expand one node; returns the ids of the children added.
    async fn expand(&self, run: &mut Run<'_>, tree: &mut SearchTree, target: usize) -> Result<Vec<usize>, AgentError> {
        tree.mark_expanded(target);
        let trajectory = tree.trajectory(target);

        run.state.set_stage(Stage::Thinking);
        let outcomes = {
            let run_ref: &Run<'_> = run;
            join_all((0..self.options.max_branches).map(|b| self.propose(run_ref, &trajectory, b))).await
        };

        let mut candidates = Vec::new();
        let mut first_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(c) => candidates.push(c),
                Err(e) => {
                    warn!(node = target, error = %e, "Candidate expansion failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        if candidates.is_empty()
            && let Some(e) = first_error
        {
            run.state.set_stage(Stage::Failed);
            return Err(e);
        }

        let mut added = Vec::new();
        for c in candidates {
            if c.content.trim().is_empty() {
                debug!(node = target, branch = c.branch, "Skipping empty candidate");
                continue;
            }
            let terminal = parser::has_final_answer(&c.content);
            let id = tree.add_child(target, c.content.clone(), c.score, terminal);
            run.step(StepKind::Expansion, format!("[node {id} <- {target}] {}", c.content));
            run.step(StepKind::Evaluation, format!("[node {id}] score {:.2}", c.score));
            added.push(id);
        }
        tree.backpropagate(target, self.options.aggregation);
        Ok(added)
    }

    pub async fn execute(
        &self,
        task: &str,
        context: Map<String, Value>,
        memory: Arc<dyn Memory>,
    ) -> Result<AgentResult, AgentError> {
        let mut run = Run::start(&self.profile, Architecture::Lat, task, context, memory);
        let mut tree = SearchTree::new(task);
        let mut explored = 0usize;

        while let Some(target) = tree.next_open(self.options.search_strategy, self.options.max_depth) {
            explored += 1;
            let added = self.expand(&mut run, &mut tree, target).await?;
            if added.iter().any(|&id| tree.node(id).terminal) {
                break;
            }
        }

        run.meta("explored_nodes", json!(explored));
        run.meta("tree_size", json!(tree.len()));
        run.meta("search_strategy", json!(self.options.search_strategy.as_str()));
        match serde_json::to_value(&tree) {
            Ok(v) => run.state.remember("search_tree", v),
            Err(e) => warn!(error = %e, "Could not serialize search tree"),
        }

        if let Some(best) = tree.best_terminal() {
            let node = tree.node(best);
            let answer = parser::final_answer(&node.content).unwrap_or_else(|| node.content.clone());
            Self::record_path(&mut run, &tree, best);
            run.step(StepKind::FinalAnswer, answer.clone());
            return Ok(run.finish(answer));
        }

        let output = match tree.best_partial() {
            Some(best) => {
                Self::record_path(&mut run, &tree, best);
                tree.node(best).content.clone()
            }
            None => String::new(),
        };
        Ok(run.truncate(output, Truncation::DepthLimit))
    }

    fn record_path(run: &mut Run<'_>, tree: &SearchTree, id: usize) {
        let path = tree.path(id);
        let contents: Vec<&str> = path.iter().skip(1).map(|&n| tree.node(n).content.as_str()).collect();
        run.meta("chosen_path", json!(path));
        run.meta("chosen_path_content", json!(contents));
        run.meta("path_score", json!(tree.node(id).score));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::{FnProvider, test_profile, user_prompt};
    use harkaam_core::error::ProviderError;

    fn scored(text: &str) -> f64 {
        text.rsplit("score=")
            .next()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    fn agent(provider: FnProvider, options: LatOptions) -> LatAgent {
        LatAgent::new(test_profile(Arc::new(provider)), options)
            .with_evaluator(Arc::new(FnEvaluator::new(scored)))
    }

    fn candidate_index(prompt: &str) -> usize {
        prompt
            .split("Propose candidate ")
            .nth(1)
            .and_then(|s| s.split(' ').next())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    #[test]
    fn tree_backpropagates_max_and_mean() {
        let mut tree = SearchTree::new("root");
        let a = tree.add_child(0, "a", 0.2, false);
        tree.add_child(0, "b", 0.6, false);
        tree.add_child(a, "a1", 0.9, false);
        tree.backpropagate(a, Aggregation::Max);
        assert_eq!(tree.node(a).value, 0.9);
        assert_eq!(tree.node(0).value, 0.9);

        tree.backpropagate(a, Aggregation::Mean);
        assert!((tree.node(0).value - 0.75).abs() < 1e-9);
    }

    #[test]
    fn selection_orders_and_ties() {
        let mut tree = SearchTree::new("root");
        tree.mark_expanded(0);
        let a = tree.add_child(0, "a", 0.5, false);
        let b = tree.add_child(0, "b", 0.5, false);
        let a1 = tree.add_child(a, "a1", 0.1, false);
        tree.mark_expanded(a);

        assert_eq!(tree.next_open(SearchStrategy::BestFirst, 5), Some(b));
        assert_eq!(tree.next_open(SearchStrategy::BreadthFirst, 5), Some(b));
        assert_eq!(tree.next_open(SearchStrategy::DepthFirst, 5), Some(a1));
        assert_eq!(tree.next_open(SearchStrategy::BestFirst, 1), None);

        let mut tied = SearchTree::new("root");
        tied.mark_expanded(0);
        let first = tied.add_child(0, "x", 0.7, false);
        tied.add_child(0, "y", 0.7, false);
        assert_eq!(tied.next_open(SearchStrategy::BestFirst, 3), Some(first));
        assert_eq!(tied.path(first), vec![0, first]);
    }

    #[tokio::test]
    async fn best_first_returns_highest_scoring_terminal() {
        let provider = FnProvider::new(|req| {
            let prompt = user_prompt(req);
            let reply = if prompt.contains("1. B score=0.9") {
                match candidate_index(prompt) {
                    1 => "Final Answer: via B low score=0.4",
                    _ => "Final Answer: via B high score=0.8",
                }
            } else {
                match candidate_index(prompt) {
                    1 => "A score=0.3",
                    _ => "B score=0.9",
                }
            };
            Ok(reply.to_string())
        });
        let options = LatOptions { max_branches: 2, ..LatOptions::default() };
        let agent = agent(provider, options);
        let result = agent
            .execute("pick", Map::new(), agent.profile().memory.clone())
            .await
            .unwrap();

        assert_eq!(result.output, "via B high score=0.8");
        assert_eq!(result.metadata["explored_nodes"], 2);
        assert_eq!(result.metadata["tree_size"], 5);
        assert_eq!(result.metadata["chosen_path"], json!([0, 2, 4]));
        assert_eq!(result.metadata["path_score"], 0.8);
        assert!(!result.is_truncated());
        assert_eq!(result.final_state.step_count, result.intermediate_steps.len());
    }

    #[tokio::test]
    async fn depth_one_expands_root_only() {
        let provider = FnProvider::new(|req| {
            Ok(format!("idea {} score=0.5", candidate_index(user_prompt(req))))
        });
        let options = LatOptions { max_depth: 1, max_branches: 3, ..LatOptions::default() };
        let agent = agent(provider, options);
        let result = agent
            .execute("brainstorm", Map::new(), agent.profile().memory.clone())
            .await
            .unwrap();

        assert!(result.is_truncated());
        assert_eq!(result.metadata["truncation"], "depth_limit_exceeded");
        assert_eq!(result.metadata["explored_nodes"], 1);
        assert_eq!(result.output, "idea 1 score=0.5");
        assert_eq!(result.final_state.step_count, 6);
    }

    #[tokio::test]
    async fn partial_sibling_failure_is_absorbed() {
        let provider = FnProvider::new(|req| match candidate_index(user_prompt(req)) {
            2 => Err(ProviderError::Timeout("slow".into())),
            _ => Ok("Final Answer: done score=0.6".into()),
        });
        let options = LatOptions { max_branches: 2, ..LatOptions::default() };
        let agent = agent(provider, options);
        let result = agent
            .execute("t", Map::new(), agent.profile().memory.clone())
            .await
            .unwrap();
        assert_eq!(result.output, "done score=0.6");
        assert_eq!(result.metadata["tree_size"], 2);
    }

    #[tokio::test]
    async fn all_siblings_failing_is_an_error() {
        let provider = FnProvider::new(|_| Err(ProviderError::Network("down".into())));
        let agent = agent(provider, LatOptions::default());
        let err = agent
            .execute("t", Map::new(), agent.profile().memory.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Generation { ref step, .. } if step == "expansion"));
    }

    #[tokio::test]
    async fn llm_evaluator_parses_scores() {
        let provider = FnProvider::new(|req| {
            if user_prompt(req).contains("Rate how promising") {
                Ok("Score: 7".into())
            } else {
                Ok("Final Answer: ok".into())
            }
        });
        let options = LatOptions { max_branches: 1, ..LatOptions::default() };
        let agent = LatAgent::new(test_profile(Arc::new(provider)), options);
        let result = agent
            .execute("t", Map::new(), agent.profile().memory.clone())
            .await
            .unwrap();
        assert_eq!(result.output, "ok");
        assert_eq!(result.metadata["path_score"], 0.7);
    }
}
