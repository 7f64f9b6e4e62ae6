//! ReAct pattern: Thought → Action → Observation loop.
//!
//! Each iteration generates one thought. A thought carrying the final-answer
//! marker ends the run; a thought naming a tool (`TOOL_NAME: PARAMETER`)
//! triggers the call and its observation feeds the next thought; any other
//! thought is taken as the answer.

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
pub struct ReactAgent {
    profile: AgentProfile,
}

impl ReactAgent {
    pub(crate) fn new(profile: AgentProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn prompt(run: &Run<'_>) -> String {
        format!(
            "{}{}{}Respond with your next thought.",
            run.task_header(),
            prompts::tools_block(run.tools()),
            prompts::history_block(&run.state.history),
        )
    }

    pub async fn execute(
        &self,
        task: &str,
        context: Map<String, Value>,
        memory: Arc<dyn Memory>,
    ) -> Result<AgentResult, AgentError> {
        let mut run = Run::start(&self.profile, Architecture::React, task, context, memory);
        let mut last_thought = String::new();

        for iteration in 1..=self.profile.max_iterations {
            run.meta("iterations", json!(iteration));
            let thought = run.generate("thought", &Self::prompt(&run)).await?;
            run.step(StepKind::Thought, thought.clone());

            if let Some(answer) = parser::final_answer(&thought) {
                run.step(StepKind::FinalAnswer, answer.clone());
                return Ok(run.finish(answer));
            }

            let Some(call) = parser::parse_tool_call(&thought, run.tools()) else {
                let answer = parser::section(&thought, "thought").unwrap_or(thought);
                return Ok(run.finish(answer));
            };

            let invocation = run.act(&call).await;
            run.step(StepKind::Observation, invocation.observation());
            last_thought = thought;
        }

        Ok(run.truncate(last_thought, Truncation::IterationLimit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::{SequentialMockProvider, failing_provider, test_profile};
    use harkaam_core::agent::Stage;

    fn agent(texts: &[&str]) -> (ReactAgent, Arc<SequentialMockProvider>) {
        let provider = Arc::new(SequentialMockProvider::from_texts(texts));
        (ReactAgent::new(test_profile(provider.clone())), provider)
    }

    async fn run(agent: &ReactAgent, task: &str) -> Result<AgentResult, AgentError> {
        agent
            .execute(task, Map::new(), agent.profile().memory.clone())
            .await
    }

    #[tokio::test]
    async fn direct_final_answer() {
        let (agent, provider) = agent(&["Thought: easy\nFinal Answer: 42"]);
        let result = run(&agent, "What is 6 * 7?").await.unwrap();

        assert_eq!(result.output, "42");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(result.final_state.step_count, 2);
        assert_eq!(result.intermediate_steps[1].kind, StepKind::FinalAnswer);
        assert_eq!(result.final_state.stage, Stage::Done);
        assert!(!result.is_truncated());
    }

    #[tokio::test]
    async fn tool_call_then_answer() {
        let (agent, provider) = agent(&[
            "Thought: I should compute this\ncalculator: 6 * 7",
            "Thought: the calculator said 42\nFinal Answer: 42",
        ]);
        let result = run(&agent, "What is 6 * 7?").await.unwrap();

        assert_eq!(result.output, "42");
        assert_eq!(provider.call_count(), 2);
        let kinds: Vec<StepKind> = result.intermediate_steps.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Thought,
                StepKind::Action,
                StepKind::Observation,
                StepKind::Thought,
                StepKind::FinalAnswer
            ]
        );
        assert_eq!(result.intermediate_steps[2].content, "42");
        let tool = result.intermediate_steps[1].tool.as_ref().unwrap();
        assert_eq!(tool.tool_name, "calculator");

        let stored = agent.profile().memory.get("step_2_tool").await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn plain_thought_is_the_answer() {
        let (agent, _) = agent(&["Thought: Paris is the capital of France."]);
        let result = run(&agent, "Capital of France?").await.unwrap();
        assert_eq!(result.output, "Paris is the capital of France.");
        assert_eq!(result.final_state.step_count, 1);
    }

    #[tokio::test]
    async fn tool_error_becomes_observation() {
        let (agent, _) = agent(&[
            "Action: search: rust async",
            "Final Answer: no search available",
        ]);
        let result = run(&agent, "Find docs").await.unwrap();
        assert!(result.intermediate_steps[2].content.starts_with("Error: Tool not found"));
        assert_eq!(result.output, "no search available");
    }

    #[tokio::test]
    async fn truncates_at_iteration_limit() {
        let (mut agent, provider) = agent(&["calculator: 1 + 1", "calculator: 2 + 2"]);
        agent.profile.max_iterations = 2;
        let result = run(&agent, "loop").await.unwrap();

        assert!(result.is_truncated());
        assert_eq!(result.metadata["truncation"], "iteration_limit_exceeded");
        assert_eq!(result.output, "calculator: 2 + 2");
        assert_eq!(result.final_state.step_count, 6);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn single_iteration_bound() {
        let (mut agent, provider) = agent(&["calculator: 1 + 1"]);
        agent.profile.max_iterations = 1;
        let result = run(&agent, "loop").await.unwrap();
        assert_eq!(provider.call_count(), 1);
        assert_eq!(result.final_state.step_count, result.intermediate_steps.len());
        assert_eq!(result.final_state.step_count, 3);
    }

    #[tokio::test]
    async fn generation_failure_propagates() {
        let agent = ReactAgent::new(test_profile(Arc::new(failing_provider())));
        let err = run(&agent, "anything").await.unwrap_err();
        assert!(matches!(err, AgentError::Generation { ref step, .. } if step == "thought"));
    }

    #[tokio::test]
    async fn context_reaches_the_prompt() {
        use crate::patterns::test_helpers::{FnProvider, user_prompt};
        let provider = Arc::new(FnProvider::new(|req| {
            assert!(user_prompt(req).contains("- city: Lisbon"));
            Ok("Final Answer: sunny".into())
        }));
        let agent = ReactAgent::new(test_profile(provider));
        let mut context = Map::new();
        context.insert("city".into(), json!("Lisbon"));
        let result = agent
            .execute("Weather?", context, agent.profile().memory.clone())
            .await
            .unwrap();
        assert_eq!(result.output, "sunny");
        assert_eq!(result.final_state.context["city"], "Lisbon");
    }
}
