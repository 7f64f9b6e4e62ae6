//! ReWOO pattern: plan, fan out to workers, solve.
//!
//! One planner call splits the task into `num_workers` subtasks. Workers run
//! concurrently, each with its own private `AgentState`, and reason to
//! `reasoning_depth` steps. A single solver call integrates whatever the
//! successful workers produced. The run fails only if every worker failed.

use crate::architecture::Architecture;
use crate::options::{ReasoningStyle, RewooOptions};
use crate::parser;
use crate::prompts;
use crate::run::{AgentProfile, Run};
use futures::future::join_all;
use harkaam_core::agent::{AgentResult, AgentState, Stage, StepKind};
use harkaam_core::error::AgentError;
use harkaam_core::memory::Memory;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Subtasks used when the plan yields fewer than `num_workers` items.
pub fn default_subtask(index: usize, task: &str) -> String {
    match index {
        0 => format!("Analyze the core aspects of {task}"),
        1 => format!("Consider alternative approaches to {task}"),
        _ => format!("Identify potential challenges or edge cases in {task}"),
    }
}

/// Exactly `num_workers` subtasks from a plan, padded with defaults.
pub fn assign_subtasks(plan: &str, task: &str, num_workers: usize) -> Vec<String> {
    let mut subtasks = parser::list_items(plan);
    subtasks.truncate(num_workers);
    while subtasks.len() < num_workers {
        subtasks.push(default_subtask(subtasks.len(), task));
    }
    subtasks
}

/// Heuristic ranking for tree-of-thought candidates: a final answer beats
/// everything, then more distinct words wins.
fn heuristic(candidate: &str) -> (bool, usize) {
    let words: HashSet<String> = candidate
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    (parser::has_final_answer(candidate), words.len())
}

struct WorkerOutcome {
    index: usize,
    subtask: String,
    state: AgentState,
    result: Result<String, AgentError>,
}

#[derive(Debug, Clone)]
pub struct RewooAgent {
    profile: AgentProfile,
    options: RewooOptions,
}

impl RewooAgent {
    pub(crate) fn new(profile: AgentProfile, options: RewooOptions) -> Self {
        Self { profile, options }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn options(&self) -> &RewooOptions {
        &self.options
    }

    fn worker_prompt(&self, header: &str, index: usize, subtask: &str, state: &AgentState, depth: usize) -> String {
        format!(
            "{header}Your subtask (worker {index} of {}): {subtask}\n\n{}{}Continue with reasoning step {depth} of {}. \
             If your subtask is resolved, reply with \"Final Answer:\" followed by the result.",
            self.options.num_workers,
            prompts::tools_block(&self.profile.tools),
            prompts::history_block(&state.history),
            self.options.reasoning_depth,
        )
    }

    /// One reasoning step for a worker, by the configured style.
    async fn think(
        &self,
        system: &str,
        header: &str,
        index: usize,
        subtask: &str,
        state: &AgentState,
        depth: usize,
    ) -> Result<String, AgentError> {
        let step = format!("worker_{index}");
        let prompt = self.worker_prompt(header, index, subtask, state, depth);
        match self.options.reasoning_style {
            ReasoningStyle::ChainOfThought => self.profile.llm.generate(&step, system, &prompt).await,
            ReasoningStyle::TreeOfThought => {
                let branches = self.options.tree_branches.max(1);
                let mut best: Option<(String, (bool, usize))> = None;
                for branch in 1..=branches {
                    let branch_prompt = format!("{prompt}\nPropose option {branch} of {branches}.");
                    let candidate = self.profile.llm.generate(&step, system, &branch_prompt).await?;
                    let rank = heuristic(&candidate);
                    if best.as_ref().is_none_or(|(_, r)| rank > *r) {
                        best = Some((candidate, rank));
                    }
                }
                Ok(best.map(|(c, _)| c).unwrap_or_default())
            }
        }
    }

    async fn work(&self, system: &str, header: &str, index: usize, subtask: String) -> WorkerOutcome {
        let mut state = AgentState::new();
        state.remember("subtask", json!(subtask));
        state.set_stage(Stage::Thinking);
        let mut last = String::new();

        for depth in 1..=self.options.reasoning_depth {
            let thought = match self.think(system, header, index, &subtask, &state, depth).await {
                Ok(t) => t,
                Err(e) => {
                    warn!(worker = index, error = %e, "Worker failed");
                    state.set_stage(Stage::Failed);
                    return WorkerOutcome { index, subtask, state, result: Err(e) };
                }
            };
            state.record(StepKind::Thought, thought.clone());

            if let Some(answer) = parser::final_answer(&thought) {
                last = answer;
                break;
            }
            if let Some(call) = parser::parse_tool_call(&thought, &self.profile.tools) {
                state.set_stage(Stage::Acting);
                let invocation = self.profile.tools.invoke(&call.name, &call.parameter).await;
                let observation = invocation.observation();
                state.record_tool(StepKind::Action, format!("{}: {}", call.name, call.parameter), invocation);
                state.record(StepKind::Observation, observation.clone());
                state.set_stage(Stage::Thinking);
                last = observation;
            } else {
                last = thought;
            }
        }

        if parser::is_empty_field(&last) {
            warn!(worker = index, "Worker produced no output");
            state.set_stage(Stage::Failed);
            let err = AgentError::EmptyOutput(format!("worker {index}"));
            return WorkerOutcome { index, subtask, state, result: Err(err) };
        }

        state.set_stage(Stage::Done);
        WorkerOutcome { index, subtask, state, result: Ok(last) }
    }

    pub async fn execute(
        &self,
        task: &str,
        context: Map<String, Value>,
        memory: Arc<dyn Memory>,
    ) -> Result<AgentResult, AgentError> {
        let mut run = Run::start(&self.profile, Architecture::Rewoo, task, context, memory);
        let n = self.options.num_workers;

        // ── Plan ──
        let prompt = format!(
            "{}{}Break the task into {n} subtasks that independent workers can solve in parallel. \
             List them as \"Worker 1: ...\", \"Worker 2: ...\" and so on.",
            run.task_header(),
            prompts::tools_block(run.tools()),
        );
        let plan = run.generate("plan", &prompt).await?;
        run.step(StepKind::Plan, plan.clone());
        let subtasks = assign_subtasks(&plan, task, n);
        run.state.remember("subtasks", json!(subtasks));

        // ── Workers ──
        let header = run.task_header();
        let system = run.system.clone();
        info!(workers = n, style = self.options.reasoning_style.as_str(), "Dispatching workers");
        let outcomes = join_all(
            subtasks
                .into_iter()
                .enumerate()
                .map(|(i, subtask)| self.work(&system, &header, i + 1, subtask)),
        )
        .await;

        let mut reports = Vec::new();
        let mut results = Vec::new();
        for outcome in outcomes {
            for step in &outcome.state.history {
                if let Some(invocation) = &step.tool {
                    run.record_invocation(invocation.clone()).await;
                }
            }
            match outcome.result {
                Ok(output) => {
                    run.step(
                        StepKind::Worker,
                        format!("[worker {}] {}\n{}", outcome.index, outcome.subtask, output),
                    );
                    reports.push(json!({
                        "index": outcome.index,
                        "subtask": outcome.subtask,
                        "status": "success",
                        "output": output,
                        "steps": outcome.state.step_count,
                    }));
                    results.push((outcome.index, outcome.subtask, output));
                }
                Err(e) => reports.push(json!({
                    "index": outcome.index,
                    "subtask": outcome.subtask,
                    "status": "failed",
                    "error": e.to_string(),
                    "steps": outcome.state.step_count,
                })),
            }
        }

        run.meta("num_workers", json!(n));
        run.meta("reasoning_style", json!(self.options.reasoning_style.as_str()));
        run.meta("reasoning_depth", json!(self.options.reasoning_depth));
        run.meta("successful_workers", json!(results.len()));
        run.meta("failed_workers", json!(n - results.len()));
        run.meta("workers", Value::Array(reports));

        if results.is_empty() {
            run.state.set_stage(Stage::Failed);
            warn!(attempted = n, "All workers failed");
            return Err(AgentError::AllWorkersFailed { attempted: n });
        }

        // ── Solve ──
        let findings: String = results
            .iter()
            .map(|(i, subtask, output)| format!("Worker {i} ({subtask}):\n{output}\n\n"))
            .collect();
        let prompt = format!(
            "{}Plan:\n{plan}\n\nWorker results:\n{findings}Integrate the worker results into one complete answer to the task.",
            run.task_header(),
        );
        let solution = run.generate("solve", &prompt).await?;
        let answer = parser::final_answer(&solution).unwrap_or(solution);
        run.step(StepKind::FinalAnswer, answer.clone());
        Ok(run.finish(answer))
    }
}
