//! Prompt assembly.
//!
//! Every generation call carries a system prompt (who the agent is and how
//! the architecture wants answers shaped) and a user prompt assembled from
//! the task, the run context and prior steps.

use crate::architecture::Architecture;
use harkaam_core::agent::StepRecord;
use harkaam_core::tool::ToolRegistry;
use serde_json::{Map, Value};

pub const DEFAULT_DESCRIPTION: &str = "a helpful AI assistant";

const TOOL_SYNTAX: &str =
    "To use a tool, write a line of the form TOOL_NAME: PARAMETER and stop. \
     When you know the answer, write a line starting with \"Final Answer:\".";

/// System prompt for one agent.
///
/// A custom prompt replaces the generated preamble; the architecture's
/// instructions are always appended.
pub fn system_prompt(name: &str, description: &str, custom: Option<&str>, architecture: Architecture) -> String {
    let preamble = match custom.map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => format!("You are {name}, {description}."),
    };
    format!("{preamble}\n\n{}", instructions(architecture))
}

fn instructions(architecture: Architecture) -> String {
    match architecture {
        Architecture::React => format!(
            "Solve the task by alternating reasoning and acting. Reply with one thought at a time. {TOOL_SYNTAX}"
        ),
        Architecture::Ooda => format!(
            "You work in observe, orient, decide, act cycles. Answer only the phase you are asked for. {TOOL_SYNTAX}"
        ),
        Architecture::Bdi => format!(
            "You reason with beliefs (what is true), desires (what you want) and intentions \
             (the plan you commit to). Answer only what you are asked for. {TOOL_SYNTAX}"
        ),
        Architecture::Lat => "You explore several candidate solution paths. Continue the given partial \
             solution with one concrete next step. When the step completes the solution, write a line \
             starting with \"Final Answer:\"."
            .to_string(),
        Architecture::Raise => format!(
            "You keep a scratch pad of your reasoning. Add one new thought per turn, building on the \
             scratch pad. {TOOL_SYNTAX}"
        ),
        Architecture::Rewoo => "You plan work up front, reason about focused subtasks and combine \
             their findings into one answer. Be concise and concrete."
            .to_string(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `Context:` block listing caller-supplied facts, or nothing.
pub fn context_block(context: &Map<String, Value>) -> String {
    if context.is_empty() {
        return String::new();
    }
    let mut out = String::from("Context:\n");
    for (key, value) in context {
        out.push_str(&format!("- {key}: {}\n", render_value(value)));
    }
    out.push('\n');
    out
}

/// `Available tools:` block, or nothing when the registry is empty.
pub fn tools_block(tools: &ToolRegistry) -> String {
    if tools.is_empty() {
        return String::new();
    }
    format!("Available tools:\n{}\n\n", tools.describe())
}

/// Previous steps rendered as `Label: content` lines.
pub fn history_block(steps: &[StepRecord]) -> String {
    if steps.is_empty() {
        return String::new();
    }
    let mut out = String::from("Previous steps:\n");
    for step in steps {
        out.push_str(&format!("{}: {}\n", step.kind.label(), step.content));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use harkaam_core::agent::{AgentState, StepKind};
    use serde_json::json;

    #[test]
    fn preamble_uses_name_and_description() {
        let prompt = system_prompt("Scout", DEFAULT_DESCRIPTION, None, Architecture::React);
        assert!(prompt.starts_with("You are Scout, a helpful AI assistant."));
        assert!(prompt.contains("TOOL_NAME: PARAMETER"));
    }

    #[test]
    fn custom_prompt_replaces_preamble() {
        let prompt = system_prompt("Scout", "x", Some("Be terse."), Architecture::Lat);
        assert!(prompt.starts_with("Be terse."));
        assert!(!prompt.contains("You are Scout"));
    }

    #[test]
    fn blocks_are_empty_without_content() {
        assert_eq!(context_block(&Map::new()), "");
        assert_eq!(tools_block(&ToolRegistry::new()), "");
        assert_eq!(history_block(&[]), "");
    }

    #[test]
    fn context_and_history_render() {
        let mut context = Map::new();
        context.insert("city".into(), json!("Lisbon"));
        context.insert("days".into(), json!(3));
        assert_eq!(context_block(&context), "Context:\n- city: Lisbon\n- days: 3\n\n");

        let mut state = AgentState::new();
        state.record(StepKind::Thought, "check weather");
        assert_eq!(history_block(&state.history), "Previous steps:\nThought: check weather\n\n");
    }
}
