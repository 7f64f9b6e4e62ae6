//! Conversation buffer: key-value memory plus a capped message log.

use async_trait::async_trait;
use harkaam_core::error::MemoryError;
use harkaam_core::memory::{ConversationMemory, Memory};
use harkaam_core::message::{Message, Role};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_MAX_MESSAGES: usize = 100;

#[derive(Default)]
struct Inner {
    entries: BTreeMap<String, Value>,
    messages: VecDeque<Message>,
}

/// Keeps at most `max_messages` messages; the oldest are dropped first.
#[derive(Clone)]
pub struct ConversationBuffer {
    max_messages: usize,
    inner: Arc<RwLock<Inner>>,
}

impl ConversationBuffer {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages: max_messages.max(1),
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub async fn message_count(&self) -> usize {
        self.inner.read().await.messages.len()
    }

    /// The full retained log, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.inner.read().await.messages.iter().cloned().collect()
    }
}

impl Default for ConversationBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

#[async_trait]
impl Memory for ConversationBuffer {
    fn name(&self) -> &str { "conversation_buffer" }

    async fn add(&self, key: &str, value: Value) -> Result<(), MemoryError> {
        if key.is_empty() {
            return Err(MemoryError::InvalidKey("empty key".into()));
        }
        self.inner.write().await.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, MemoryError> {
        Ok(self.inner.read().await.entries.get(key).cloned())
    }

    async fn update(&self, key: &str, value: Value) -> Result<bool, MemoryError> {
        let mut inner = self.inner.write().await;
        match inner.entries.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, MemoryError> {
        Ok(self.inner.write().await.entries.remove(key).is_some())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.messages.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, MemoryError> {
        Ok(self.inner.read().await.entries.keys().cloned().collect())
    }
}

#[async_trait]
impl ConversationMemory for ConversationBuffer {
    async fn add_message(&self, role: Role, content: &str) -> Result<(), MemoryError> {
        let mut inner = self.inner.write().await;
        inner.messages.push_back(Message::new(role, content));
        while inner.messages.len() > self.max_messages {
            inner.messages.pop_front();
        }
        Ok(())
    }

    async fn get_conversation_history(&self, n: usize) -> Result<Vec<Message>, MemoryError> {
        let inner = self.inner.read().await;
        let skip = inner.messages.len().saturating_sub(n);
        Ok(inner.messages.iter().skip(skip).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn history_returns_most_recent_in_order() {
        let mem = ConversationBuffer::default();
        mem.add_message(Role::User, "one").await.unwrap();
        mem.add_message(Role::Assistant, "two").await.unwrap();
        mem.add_message(Role::User, "three").await.unwrap();

        let recent = mem.get_conversation_history(2).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "three"]);

        let all = mem.get_conversation_history(10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].role, Role::User);
    }

    #[tokio::test]
    async fn buffer_trims_oldest_messages() {
        let mem = ConversationBuffer::new(2);
        for i in 0..5 {
            mem.add_message(Role::User, &format!("m{i}")).await.unwrap();
        }
        let all = mem.messages().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "m3");
        assert_eq!(all[1].content, "m4");
    }

    #[tokio::test]
    async fn clear_drops_messages_and_keys() {
        let mem = ConversationBuffer::default();
        mem.add("topic", json!("rust")).await.unwrap();
        mem.add_message(Role::User, "hi").await.unwrap();
        mem.clear().await.unwrap();
        assert_eq!(mem.message_count().await, 0);
        assert!(mem.get("topic").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_requires_existing_key() {
        let mem = ConversationBuffer::default();
        assert!(!mem.update("k", json!(1)).await.unwrap());
        mem.add("k", json!(1)).await.unwrap();
        assert!(mem.update("k", json!(2)).await.unwrap());
        assert_eq!(mem.get("k").await.unwrap(), Some(json!(2)));
    }
}
