//! Memory implementations for Harkaam agents.

pub mod noop;
pub mod in_memory;
pub mod conversation;

pub use noop::NoopMemory;
pub use in_memory::InMemoryStore;
pub use conversation::{ConversationBuffer, DEFAULT_MAX_MESSAGES};

use harkaam_core::error::MemoryError;
use harkaam_core::memory::Memory;
use std::sync::Arc;

/// Build a memory by kind name: `simple`, `conversation_buffer` or `none`.
pub fn create_memory(kind: &str, max_messages: usize) -> Result<Arc<dyn Memory>, MemoryError> {
    let memory: Arc<dyn Memory> = match kind.trim().to_lowercase().as_str() {
        "simple" | "in_memory" => Arc::new(InMemoryStore::new()),
        "conversation_buffer" | "conversation" => Arc::new(ConversationBuffer::new(max_messages)),
        "none" | "noop" => Arc::new(NoopMemory),
        other => return Err(MemoryError::Storage(format!("Unknown memory type: {other}"))),
    };
    tracing::debug!(memory = memory.name(), max_messages, "Memory backend created");
    Ok(memory)
}
