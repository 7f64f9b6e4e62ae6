//! In-memory key-value store: the default per-agent memory.

use async_trait::async_trait;
use chrono::Utc;
use harkaam_core::error::MemoryError;
use harkaam_core::memory::Memory;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A key-value store kept in process memory.
///
/// Object values gain a `created_at` timestamp on `add`; `update` keeps it
/// and stamps `updated_at`.
#[derive(Clone)]
pub struct InMemoryStore {
    entries: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Snapshot of every stored entry.
    pub async fn get_all(&self) -> BTreeMap<String, Value> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

#[async_trait]
impl Memory for InMemoryStore {
    fn name(&self) -> &str { "simple" }

    async fn add(&self, key: &str, mut value: Value) -> Result<(), MemoryError> {
        if key.is_empty() {
            return Err(MemoryError::InvalidKey("empty key".into()));
        }
        if let Value::Object(map) = &mut value {
            map.entry("created_at").or_insert_with(now);
        }
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, MemoryError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn update(&self, key: &str, mut value: Value) -> Result<bool, MemoryError> {
        let mut entries = self.entries.write().await;
        let Some(existing) = entries.get(key) else {
            return Ok(false);
        };
        if let (Value::Object(old), Value::Object(new)) = (existing, &mut value) {
            if let Some(created) = old.get("created_at") {
                new.entry("created_at").or_insert_with(|| created.clone());
            }
            new.insert("updated_at".into(), now());
        }
        entries.insert(key.to_string(), value);
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, MemoryError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, MemoryError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}
