//! Tool trait: the abstraction over agent capabilities.
//!
//! Engines call tools through a one-line textual form (`TOOL_NAME: PARAMETER`),
//! so a tool takes a single string parameter. A tool may declare a typed
//! parameter list; the registry checks the string against the first declared
//! parameter before invoking.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use crate::error::ToolError;

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Accepted parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Float,
    Boolean,
}

/// One declared tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, kind: ParameterType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Check a raw textual value against this parameter's declared type.
    pub fn validate(&self, raw: &str) -> std::result::Result<(), ToolError> {
        let value = raw.trim();
        if value.is_empty() {
            return if self.required {
                Err(ToolError::InvalidArguments(format!(
                    "missing required parameter '{}'",
                    self.name
                )))
            } else {
                Ok(())
            };
        }
        let valid = match self.kind {
            ParameterType::String => true,
            ParameterType::Integer => value.parse::<i64>().is_ok(),
            ParameterType::Float => value.parse::<f64>().is_ok(),
            ParameterType::Boolean => matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "false" | "yes" | "no" | "1" | "0"
            ),
        };
        if valid {
            Ok(())
        } else {
            Err(ToolError::InvalidArguments(format!(
                "parameter '{}' expects {:?}, got '{value}'",
                self.name, self.kind
            )))
        }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (shown to the LLM).
    fn description(&self) -> &str;

    /// Declared parameters. Empty means "any string".
    fn parameters(&self) -> Vec<ToolParameter> {
        Vec::new()
    }

    /// Execute the tool with its single textual parameter.
    async fn execute(&self, input: &str) -> std::result::Result<ToolResult, ToolError>;
}

type ToolFn = dyn Fn(&str) -> std::result::Result<String, String> + Send + Sync;

/// A tool backed by a plain closure.
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: Vec<ToolParameter>,
    func: Arc<ToolFn>,
}

impl FunctionTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            func: Arc::new(func),
        }
    }

    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        self.parameters.clone()
    }

    async fn execute(&self, input: &str) -> std::result::Result<ToolResult, ToolError> {
        (self.func)(input)
            .map(ToolResult::ok)
            .map_err(|reason| ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason,
            })
    }
}

/// What came back from one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success {
        output: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    Error {
        error: String,
    },
}

/// Record of a single tool call made during an act step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub input: String,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

impl ToolInvocation {
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Error { .. })
    }

    /// The text fed back to the model as an observation.
    pub fn observation(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success { output, .. } => output.clone(),
            ToolOutcome::Error { error } => format!("Error: {error}"),
        }
    }
}

/// A registry of available tools.
///
/// Names are matched case-insensitively. The registry is cheap to clone
/// and only read during a run.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_lowercase();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(&name.trim().to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(&name.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.values().map(|t| t.name().to_string()).collect();
        names.sort();
        names
    }

    /// One "- name: description" line per tool, sorted by name.
    pub fn describe(&self) -> String {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Validate and execute a tool call.
    pub async fn execute(&self, name: &str, input: &str) -> std::result::Result<ToolResult, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound(name.trim().to_string()))?;
        if let Some(first) = tool.parameters().first() {
            first.validate(input)?;
        }
        tool.execute(input.trim()).await
    }

    /// Execute a tool call, folding any failure into the invocation record.
    pub async fn invoke(&self, name: &str, input: &str) -> ToolInvocation {
        let outcome = match self.execute(name, input).await {
            Ok(result) if result.success => ToolOutcome::Success {
                output: result.output,
                data: result.data,
            },
            Ok(result) => ToolOutcome::Error {
                error: result.output,
            },
            Err(e) => ToolOutcome::Error {
                error: e.to_string(),
            },
        };
        ToolInvocation {
            tool_name: name.trim().to_string(),
            input: input.trim().to_string(),
            outcome,
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "Echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        async fn execute(&self, input: &str) -> std::result::Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(input))
        }
    }

    fn double_tool() -> FunctionTool {
        FunctionTool::new("double", "Doubles an integer", |input| {
            input
                .parse::<i64>()
                .map(|n| (n * 2).to_string())
                .map_err(|e| e.to_string())
        })
        .with_parameter(ToolParameter::new("n", ParameterType::Integer, "number to double"))
    }

    #[test]
    fn registry_register_and_lookup_ignores_case() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get(" ECHO ").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.names(), vec!["Echo".to_string()]);
    }

    #[test]
    fn registry_describe_lists_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(double_tool()));
        assert_eq!(
            registry.describe(),
            "- Echo: Echoes back the input\n- double: Doubles an integer"
        );
    }

    #[tokio::test]
    async fn registry_executes_function_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(double_tool()));
        let result = registry.execute("double", " 21 ").await.unwrap();
        assert_eq!(result.output, "42");
    }

    #[tokio::test]
    async fn registry_rejects_mistyped_parameter() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(double_tool()));
        let err = registry.execute("double", "twelve").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn invoke_folds_missing_tool_into_record() {
        let registry = ToolRegistry::new();
        let record = registry.invoke("search", "rust").await;
        assert!(record.is_error());
        assert_eq!(record.tool_name, "search");
        assert!(record.observation().starts_with("Error: Tool not found"));
    }

    #[tokio::test]
    async fn invocation_serializes_flat() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let record = registry.invoke("echo", "hi").await;
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["output"], "hi");
        assert_eq!(json["tool_name"], "echo");
    }

    #[test]
    fn optional_parameter_accepts_empty() {
        let p = ToolParameter::new("flag", ParameterType::Boolean, "").optional();
        assert!(p.validate("").is_ok());
        assert!(p.validate("yes").is_ok());
        assert!(p.validate("maybe").is_err());
    }
}
