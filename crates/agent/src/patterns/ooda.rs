//! OODA pattern: Observe → Orient → Decide → Act cycles.
//!
//! The result of each act phase is fed into the next cycle's observation.
//! A decision carrying the final-answer marker ends the run.

use crate::architecture::Architecture;
use crate::parser;
use crate::prompts;
use crate::run::{AgentProfile, Run, Truncation};
use harkaam_core::agent::{AgentResult, StepKind};
use harkaam_core::error::AgentError;
use harkaam_core::memory::Memory;
use serde_json::{Map, Value, json};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct OodaAgent {
    profile: AgentProfile,
}

impl OodaAgent {
    pub(crate) fn new(profile: AgentProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub async fn execute(
        &self,
        task: &str,
        context: Map<String, Value>,
        memory: Arc<dyn Memory>,
    ) -> Result<AgentResult, AgentError> {
        let mut run = Run::start(&self.profile, Architecture::Ooda, task, context, memory);
        let mut last_result: Option<String> = None;

        for cycle in 1..=self.profile.max_iterations {
            run.meta("iterations", json!(cycle));

            // ── Observe ──
            let previous = match &last_result {
                Some(r) => format!("Result of your last action:\n{r}\n\n"),
                None => String::new(),
            };
            let prompt = format!(
                "{}{}{previous}Observe the current situation. What do you know and what is still missing?",
                run.task_header(),
                prompts::history_block(&run.state.history),
            );
            let observation = run.generate("observe", &prompt).await?;
            run.step(StepKind::Observation, observation.clone());

            // ── Orient ──
            let prompt = format!(
                "{}Current observation:\n{observation}\n\nAnalyse this observation. What does it mean for the task?",
                run.task_header(),
            );
            let orientation = run.generate("orient", &prompt).await?;
            run.step(StepKind::Orientation, orientation.clone());

            // ── Decide ──
            let prompt = format!(
                "{}{}Current orientation:\n{orientation}\n\nDecide on one concrete action. \
                 If the task is already solved, reply with \"Final Answer:\" followed by the answer.",
                run.task_header(),
                prompts::tools_block(run.tools()),
            );
            let decision = run.generate("decide", &prompt).await?;
            run.step(StepKind::Decision, decision.clone());

            if let Some(answer) = parser::final_answer(&decision) {
                run.step(StepKind::FinalAnswer, answer.clone());
                return Ok(run.finish(answer));
            }

            // ── Act ──
            let result = match parser::parse_tool_call(&decision, run.tools()) {
                Some(call) => run.act(&call).await.observation(),
                None => {
                    let prompt = format!(
                        "{}Decision:\n{decision}\n\nCarry out this decision and report the outcome.",
                        run.task_header(),
                    );
                    let outcome = run.generate("act", &prompt).await?;
                    run.step(StepKind::Action, outcome.clone());
                    outcome
                }
            };
            last_result = Some(result);
        }

        let output = last_result
            .or_else(|| run.state.last_of(StepKind::Decision).map(str::to_string))
            .unwrap_or_default();
        Ok(run.truncate(output, Truncation::IterationLimit))
    }
}
