//! RAISE pattern: reasoning over an evolving scratch pad.
//!
//! The pad starts with the task and any worked examples. Each thought and
//! tool observation is appended, and the whole pad is written to memory
//! under `scratch_pad` after every change so callers can watch it grow.

use crate::architecture::Architecture;
use crate::options::{RaiseOptions, ScratchPadFormat};
use crate::parser;
use crate::prompts;
use crate::run::{AgentProfile, Run, Truncation};
use harkaam_core::agent::{AgentResult, StepKind};
use harkaam_core::error::AgentError;
use harkaam_core::memory::Memory;
use serde_json::{Map, Value, json};
use std::sync::Arc;

pub const SCRATCH_PAD_KEY: &str = "scratch_pad";

#[derive(Debug, Clone, PartialEq)]
pub struct ScratchPad {
    format: ScratchPadFormat,
    text: String,
}

impl ScratchPad {
    pub fn new(format: ScratchPadFormat, task: &str, examples: &[String]) -> Self {
        let mut text = match format {
            ScratchPadFormat::Markdown => format!("# Task\n{task}\n\n"),
            ScratchPadFormat::Plain => format!("TASK: {task}\n\n"),
        };
        if !examples.is_empty() {
            text.push_str(match format {
                ScratchPadFormat::Markdown => "## Examples\n",
                ScratchPadFormat::Plain => "EXAMPLES:\n",
            });
            for (i, example) in examples.iter().enumerate() {
                match format {
                    ScratchPadFormat::Markdown => {
                        text.push_str(&format!("### Example {}\n{}\n\n", i + 1, example.trim()))
                    }
                    ScratchPadFormat::Plain => {
                        text.push_str(&format!("Example {}: {}\n", i + 1, example.trim()))
                    }
                }
            }
            if format == ScratchPadFormat::Plain {
                text.push('\n');
            }
        }
        text.push_str(match format {
            ScratchPadFormat::Markdown => "## Reasoning\n",
            ScratchPadFormat::Plain => "REASONING:\n",
        });
        Self { format, text }
    }

    pub fn append(&mut self, label: &str, content: &str) {
        let entry = match self.format {
            ScratchPadFormat::Markdown => format!("- **{label}:** {}\n", content.trim()),
            ScratchPadFormat::Plain => format!("{label}: {}\n", content.trim()),
        };
        self.text.push_str(&entry);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone)]
pub struct RaiseAgent {
    profile: AgentProfile,
    options: RaiseOptions,
}

impl RaiseAgent {
    pub(crate) fn new(profile: AgentProfile, options: RaiseOptions) -> Self {
        Self { profile, options }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn options(&self) -> &RaiseOptions {
        &self.options
    }

    async fn save(run: &mut Run<'_>, pad: &ScratchPad) {
        run.state.remember(SCRATCH_PAD_KEY, json!(pad.as_str()));
        run.persist(SCRATCH_PAD_KEY, json!(pad.as_str())).await;
    }

    pub async fn execute(
        &self,
        task: &str,
        context: Map<String, Value>,
        memory: Arc<dyn Memory>,
    ) -> Result<AgentResult, AgentError> {
        let mut run = Run::start(&self.profile, Architecture::Raise, task, context, memory);
        let mut pad = ScratchPad::new(self.options.format, task, &self.options.examples);
        Self::save(&mut run, &pad).await;
        let mut last_thought = String::new();

        for iteration in 1..=self.profile.max_iterations {
            run.meta("iterations", json!(iteration));
            let prompt = format!(
                "{}{}Scratch pad:\n{}\n\nAdd your next thought.",
                run.task_header(),
                prompts::tools_block(run.tools()),
                pad.as_str(),
            );
            let thought = run.generate("thought", &prompt).await?;
            pad.append("Thought", &thought);
            run.step(StepKind::Thought, thought.clone());
            Self::save(&mut run, &pad).await;

            if let Some(answer) = parser::final_answer(&thought) {
                pad.append("Final Answer", &answer);
                Self::save(&mut run, &pad).await;
                run.step(StepKind::FinalAnswer, answer.clone());
                run.meta(SCRATCH_PAD_KEY, json!(pad.as_str()));
                return Ok(run.finish(answer));
            }

            if let Some(call) = parser::parse_tool_call(&thought, run.tools()) {
                let observation = run.act(&call).await.observation();
                pad.append("Observation", &observation);
                run.step(StepKind::Observation, observation);
                Self::save(&mut run, &pad).await;
            }
            last_thought = thought;
        }

        run.meta(SCRATCH_PAD_KEY, json!(pad.as_str()));
        Ok(run.truncate(last_thought, Truncation::IterationLimit))
    }
}
