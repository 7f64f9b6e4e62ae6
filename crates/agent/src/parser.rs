//! Response parsing: pulls structure out of free-form model text.
//!
//! Nothing here fails: text that does not match a grammar is treated as
//! plain reasoning and the caller decides what to do with it.

use harkaam_core::tool::ToolRegistry;
use regex_lite::Regex;
use std::sync::LazyLock;

static FINAL_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)final\s+answer\s*:").expect("final answer pattern"));

static ACTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^action\s*\d*\s*:\s*(.*)$").expect("action pattern"));

static COLON_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][\w\-.]*)\s*:\s*(.*)$").expect("colon call pattern"));

static PAREN_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][\w\-.]*)\s*\((.*)\)\s*$").expect("paren call pattern"));

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:worker|task|subtask|sub-task|step)\s*\d+\s*[:.)\-]|\d+\s*[.):]|[-*•])\s*(.+)$")
        .expect("list item pattern")
});

static SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:score|rating|value)\s*(?:is)?\s*[:=]?\s*(-?\d+(?:\.\d+)?)").expect("score pattern")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("number pattern"));

/// Labels that open a section in structured responses.
const SECTION_LABELS: &[&str] = &[
    "thought",
    "action",
    "observation",
    "orientation",
    "decision",
    "belief",
    "beliefs",
    "desire",
    "desires",
    "intention",
    "intentions",
    "plan",
    "final answer",
];

/// Does the text carry the final-answer marker?
pub fn has_final_answer(text: &str) -> bool {
    FINAL_ANSWER.is_match(text)
}

/// The answer following the final-answer marker.
///
/// An empty tail falls back to the text before the marker.
pub fn final_answer(text: &str) -> Option<String> {
    let m = FINAL_ANSWER.find(text)?;
    let after = text[m.end()..].trim();
    let answer = if after.is_empty() {
        text[..m.start()].trim()
    } else {
        after
    };
    Some(answer.to_string())
}

/// A `TOOL_NAME: PARAMETER` call recognised in a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    pub parameter: String,
}

fn clean_line(line: &str) -> String {
    line.replace("**", "")
        .trim()
        .trim_start_matches(['-', '*', '>', '#', '•'])
        .trim()
        .to_string()
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    for q in ['"', '\'', '`'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return s[1..s.len() - 1].trim();
        }
    }
    s
}

fn split_call(rest: &str) -> Option<(String, String)> {
    if let Some(c) = PAREN_CALL.captures(rest) {
        return Some((c[1].to_string(), strip_quotes(&c[2]).to_string()));
    }
    COLON_CALL
        .captures(rest)
        .map(|c| (c[1].to_string(), strip_quotes(&c[2]).to_string()))
}

/// Find the first tool call in `text`.
///
/// A bare `name: parameter` line only counts when `name` is a registered
/// tool. After an explicit `Action:` prefix any name counts, except section
/// labels, so an unknown tool surfaces as a not-found observation.
pub fn parse_tool_call(text: &str, tools: &ToolRegistry) -> Option<ToolCall> {
    for raw in text.lines() {
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }
        let (explicit, rest) = match ACTION_PREFIX.captures(&line) {
            Some(c) => (true, c[1].trim().to_string()),
            None => (false, line.clone()),
        };
        let Some((name, parameter)) = split_call(&rest) else {
            continue;
        };
        let is_label = SECTION_LABELS.contains(&name.to_lowercase().as_str());
        if tools.contains(&name) || (explicit && !is_label) {
            return Some(ToolCall { name, parameter });
        }
    }
    None
}

fn section_header(line: &str) -> Option<(&'static str, String)> {
    let cleaned = clean_line(line);
    let lower = cleaned.to_lowercase();
    SECTION_LABELS
        .iter()
        .filter(|label| {
            lower.starts_with(*label) && lower[label.len()..].trim_start().starts_with(':')
        })
        .max_by_key(|label| label.len())
        .map(|label| {
            let after = cleaned.get(label.len()..).unwrap_or_default();
            let after = after.trim_start().trim_start_matches(':').trim();
            (*label, after.to_string())
        })
}

/// Text of the first section headed `label:` (singular or plural), up to
/// the next recognised header.
pub fn section(text: &str, label: &str) -> Option<String> {
    let wanted = label.to_lowercase();
    let plural = format!("{wanted}s");
    let mut collected: Option<Vec<String>> = None;

    for line in text.lines() {
        let header = section_header(line);
        if let Some(lines) = collected.as_mut() {
            if header.is_some() {
                break;
            }
            lines.push(line.trim().to_string());
            continue;
        }
        if let Some((found, first)) = header
            && (found == wanted || found == plural)
        {
            collected = Some(vec![first]);
        }
    }

    collected
        .map(|lines| lines.join("\n").trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Items of a numbered, bulleted or `Task N:` list.
pub fn list_items(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.replace("**", "");
            LIST_ITEM
                .captures(line.trim())
                .map(|c| c[1].trim().to_string())
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// A score in `[0, 1]`. Values above 1 are read as out of 10.
pub fn parse_score(text: &str) -> Option<f64> {
    let raw = SCORE
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
        .or_else(|| NUMBER.find(text).and_then(|m| m.as_str().parse::<f64>().ok()))?;
    let scaled = if raw > 1.0 { raw / 10.0 } else { raw };
    Some(scaled.clamp(0.0, 1.0))
}

/// Whether a generated field says "nothing here".
pub fn is_empty_field(text: &str) -> bool {
    let t = text.trim().trim_end_matches('.').to_lowercase();
    t.is_empty() || matches!(t.as_str(), "none" | "n/a" | "nothing" | "no new intention" | "no new intentions")
}

/// Lowercased, whitespace-collapsed form for comparisons.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use harkaam_core::tool::FunctionTool;
    use std::sync::Arc;

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        r.register(Arc::new(FunctionTool::new("calculator", "math", |s| Ok(s.to_string()))));
        r
    }

    #[test]
    fn final_answer_marker() {
        assert!(has_final_answer("Thought: done\nFINAL ANSWER: 42"));
        assert_eq!(final_answer("Thought: done\nFinal Answer: 42").as_deref(), Some("42"));
        assert_eq!(final_answer("The result is 7. Final answer:").as_deref(), Some("The result is 7."));
        assert!(final_answer("no marker").is_none());
    }

    #[test]
    fn bare_tool_line_requires_registered_name() {
        let r = registry();
        let call = parse_tool_call("Thought: compute\ncalculator: 2 + 2", &r).unwrap();
        assert_eq!(call, ToolCall { name: "calculator".into(), parameter: "2 + 2".into() });
        assert!(parse_tool_call("Note: this is prose", &r).is_none());
    }

    #[test]
    fn action_prefix_and_paren_forms() {
        let r = registry();
        let call = parse_tool_call("**Action:** Calculator(\"15 * 4\")", &r).unwrap();
        assert_eq!(call.name, "Calculator");
        assert_eq!(call.parameter, "15 * 4");

        let unknown = parse_tool_call("Action: search: rust async", &r).unwrap();
        assert_eq!(unknown.name, "search");
    }

    #[test]
    fn action_prose_is_not_a_call() {
        let r = registry();
        assert!(parse_tool_call("Action: think harder about it", &r).is_none());
        assert!(parse_tool_call("Action: Final Answer: 3", &r).is_none());
    }

    #[test]
    fn sections_split_on_headers() {
        let text = "Beliefs: the sky is blue\nwater is wet\nDesires: stay dry\nIntention: buy umbrella";
        assert_eq!(section(text, "belief").as_deref(), Some("the sky is blue\nwater is wet"));
        assert_eq!(section(text, "desires").as_deref(), Some("stay dry"));
        assert_eq!(section(text, "desire").as_deref(), Some("stay dry"));
        assert_eq!(section(text, "intention").as_deref(), Some("buy umbrella"));
        assert!(section(text, "plan").is_none());
    }

    #[test]
    fn list_items_cover_common_shapes() {
        let text = "Plan:\n1. gather data\n2) analyse\n- summarise\nWorker 4: review\nSubtask 5: ship";
        assert_eq!(
            list_items(text),
            vec!["gather data", "analyse", "summarise", "review", "ship"]
        );
    }

    #[test]
    fn scores_normalise() {
        assert_eq!(parse_score("Score: 7"), Some(0.7));
        assert_eq!(parse_score("0.85"), Some(0.85));
        assert_eq!(parse_score("I'd rate it 8/10"), Some(0.8));
        assert_eq!(parse_score("value = 15"), Some(1.0));
        assert!(parse_score("great").is_none());
    }

    #[test]
    fn empty_fields() {
        assert!(is_empty_field(" None. "));
        assert!(is_empty_field(""));
        assert!(!is_empty_field("buy milk"));
        assert_eq!(normalize("  Buy   MILK "), "buy milk");
    }
}
