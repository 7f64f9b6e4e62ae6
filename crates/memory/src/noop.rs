//! No-op memory: disables run memory entirely.

use async_trait::async_trait;
use harkaam_core::error::MemoryError;
use harkaam_core::memory::Memory;
use serde_json::Value;

/// A memory that stores nothing.
pub struct NoopMemory;

#[async_trait]
impl Memory for NoopMemory {
    fn name(&self) -> &str { "none" }

    async fn add(&self, _key: &str, _value: Value) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn get(&self, _key: &str) -> Result<Option<Value>, MemoryError> {
        Ok(None)
    }

    async fn update(&self, _key: &str, _value: Value) -> Result<bool, MemoryError> {
        Ok(false)
    }

    async fn delete(&self, _key: &str) -> Result<bool, MemoryError> {
        Ok(false)
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, MemoryError> {
        Ok(Vec::new())
    }
}
