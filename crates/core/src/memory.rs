//! Memory traits: key-value storage consulted by reasoning engines.
//!
//! Engines record tool invocations and scratch state here during a run.
//! Each agent owns its own instance; implementations are not expected to
//! arbitrate between concurrent writers from several engines.

use async_trait::async_trait;
use serde_json::Value;
use crate::error::MemoryError;
use crate::message::{Message, Role};

/// The core Memory trait.
///
/// Implementations: in-memory store, conversation buffer, none (no-op).
#[async_trait]
pub trait Memory: Send + Sync {
    /// The backend name (e.g., "simple", "conversation_buffer", "none").
    fn name(&self) -> &str;

    /// Store a value, replacing any previous value under `key`.
    async fn add(&self, key: &str, value: Value) -> std::result::Result<(), MemoryError>;

    /// Retrieve a value.
    async fn get(&self, key: &str) -> std::result::Result<Option<Value>, MemoryError>;

    /// Replace the value under an existing key. Returns `false` when the key
    /// is absent; nothing is stored in that case.
    async fn update(&self, key: &str, value: Value) -> std::result::Result<bool, MemoryError>;

    /// Remove a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> std::result::Result<bool, MemoryError>;

    /// Drop everything.
    async fn clear(&self) -> std::result::Result<(), MemoryError>;

    /// All stored keys, sorted.
    async fn keys(&self) -> std::result::Result<Vec<String>, MemoryError>;
}

/// Memory that also keeps an ordered message log.
#[async_trait]
pub trait ConversationMemory: Memory {
    async fn add_message(&self, role: Role, content: &str) -> std::result::Result<(), MemoryError>;

    /// The most recent `n` messages in chronological order.
    async fn get_conversation_history(&self, n: usize) -> std::result::Result<Vec<Message>, MemoryError>;
}
