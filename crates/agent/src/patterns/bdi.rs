//! BDI pattern: Beliefs, Desires, Intentions, then action.
//!
//! Every cycle revises beliefs and desires, commits to an intention and
//! acts on it. The run settles when a cycle yields no new intention: the
//! model answers "none", or repeats the previous one.

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
pub struct BdiAgent {
    profile: AgentProfile,
}

impl BdiAgent {
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
        let mut run = Run::start(&self.profile, Architecture::Bdi, task, context, memory);
        let mut previous_intention: Option<String> = None;
        let mut last_output: Option<String> = None;

        for cycle in 1..=self.profile.max_iterations {
            run.meta("iterations", json!(cycle));

            let prompt = format!(
                "{}{}List your current beliefs: the facts you hold about the task and its situation.",
                run.task_header(),
                prompts::history_block(&run.state.history),
            );
            let raw = run.generate("beliefs", &prompt).await?;
            let beliefs = parser::section(&raw, "belief").unwrap_or(raw);
            run.step(StepKind::Belief, beliefs.clone());

            let prompt = format!(
                "{}Beliefs:\n{beliefs}\n\nWhat are your desires: the goals you want to achieve for this task?",
                run.task_header(),
            );
            let raw = run.generate("desires", &prompt).await?;
            let desires = parser::section(&raw, "desire").unwrap_or(raw);
            run.step(StepKind::Desire, desires.clone());

            let previous = match &previous_intention {
                Some(p) => format!("Your previous intention was:\n{p}\n\n"),
                None => String::new(),
            };
            let prompt = format!(
                "{}Beliefs:\n{beliefs}\n\nDesires:\n{desires}\n\n{previous}Commit to one desire and state \
                 your intention as a concrete plan. Reply \"none\" if no new intention is needed.",
                run.task_header(),
            );
            let raw = run.generate("intentions", &prompt).await?;
            let intention = parser::section(&raw, "intention").unwrap_or(raw);
            run.step(StepKind::Intention, intention.clone());

            let repeated = previous_intention
                .as_deref()
                .is_some_and(|p| parser::normalize(p) == parser::normalize(&intention));
            if parser::is_empty_field(&intention) || repeated {
                run.meta("stable", Value::Bool(true));
                let output = last_output.unwrap_or(beliefs);
                return Ok(run.finish(output));
            }

            let prompt = format!(
                "{}{}Intention:\n{intention}\n\nCarry out this intention and report what you did. \
                 If the task is complete, reply with \"Final Answer:\" followed by the answer.",
                run.task_header(),
                prompts::tools_block(run.tools()),
            );
            let action = run.generate("action", &prompt).await?;

            if let Some(answer) = parser::final_answer(&action) {
                run.step(StepKind::FinalAnswer, answer.clone());
                return Ok(run.finish(answer));
            }

            let output = match parser::parse_tool_call(&action, run.tools()) {
                Some(call) => {
                    let observation = run.act(&call).await.observation();
                    run.step(StepKind::Observation, observation.clone());
                    observation
                }
                None => {
                    run.step(StepKind::Action, action.clone());
                    action
                }
            };
            last_output = Some(output);
            previous_intention = Some(intention);
        }

        Ok(run.truncate(last_output.unwrap_or_default(), Truncation::IterationLimit))
    }
}
