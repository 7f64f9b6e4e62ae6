//! Memory lookup tool: lets an agent read keys from a memory store.
//!
//! Input is a key; `*` or an empty string lists the stored keys instead.

use async_trait::async_trait;
use harkaam_core::error::ToolError;
use harkaam_core::memory::Memory;
use harkaam_core::tool::{ParameterType, Tool, ToolParameter, ToolResult};
use serde_json::Value;
use std::sync::Arc;

pub struct MemoryLookupTool {
    memory: Arc<dyn Memory>,
}

impl MemoryLookupTool {
    pub fn new(memory: Arc<dyn Memory>) -> Self {
        Self { memory }
    }
}

fn storage_error(e: impl std::fmt::Display) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: "memory_lookup".into(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl Tool for MemoryLookupTool {
    fn name(&self) -> &str {
        "memory_lookup"
    }

    fn description(&self) -> &str {
        "Look up a stored value by key; use '*' to list available keys"
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::new("key", ParameterType::String, "Key to read").optional()]
    }

    async fn execute(&self, input: &str) -> Result<ToolResult, ToolError> {
        let key = input.trim();
        tracing::debug!(key, "Memory lookup");
        if key.is_empty() || key == "*" {
            let keys = self.memory.keys().await.map_err(storage_error)?;
            let output = if keys.is_empty() {
                "Memory is empty".to_string()
            } else {
                keys.join(", ")
            };
            return Ok(ToolResult::ok(output).with_data(serde_json::json!({ "keys": keys })));
        }

        match self.memory.get(key).await.map_err(storage_error)? {
            Some(Value::String(s)) => Ok(ToolResult::ok(s.clone()).with_data(Value::String(s))),
            Some(value) => Ok(ToolResult::ok(value.to_string()).with_data(value)),
            None => Ok(ToolResult {
                success: false,
                output: format!("No value stored under '{key}'"),
                data: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harkaam_memory::InMemoryStore;
    use serde_json::json;

    async fn store() -> Arc<dyn Memory> {
        let mem = InMemoryStore::new();
        mem.add("capital", json!("Paris")).await.unwrap();
        mem.add("population", json!(2_100_000)).await.unwrap();
        Arc::new(mem)
    }

    #[tokio::test]
    async fn reads_string_value() {
        let tool = MemoryLookupTool::new(store().await);
        let result = tool.execute("capital").await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "Paris");
    }

    #[tokio::test]
    async fn reads_non_string_value() {
        let tool = MemoryLookupTool::new(store().await);
        let result = tool.execute("population").await.unwrap();
        assert_eq!(result.output, "2100000");
    }

    #[tokio::test]
    async fn lists_keys() {
        let tool = MemoryLookupTool::new(store().await);
        let result = tool.execute("*").await.unwrap();
        assert_eq!(result.output, "capital, population");
    }

    #[tokio::test]
    async fn missing_key_is_unsuccessful() {
        let tool = MemoryLookupTool::new(store().await);
        let result = tool.execute("mayor").await.unwrap();
        assert!(!result.success);
    }
}
