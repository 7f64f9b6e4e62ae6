//! Built-in tool implementations for Harkaam.
//!
//! Tools give an agent something to do besides think: evaluate arithmetic
//! or read values back out of a memory store.

pub mod calculator;
pub mod memory_lookup;

pub use calculator::CalculatorTool;
pub use memory_lookup::MemoryLookupTool;

use harkaam_core::memory::Memory;
use harkaam_core::tool::ToolRegistry;
use std::sync::Arc;

/// Create a registry with the stateless built-in tools.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CalculatorTool));
    registry
}

/// Built-in tools plus a `memory_lookup` tool bound to `memory`.
pub fn registry_with_memory(memory: Arc<dyn Memory>) -> ToolRegistry {
    let mut registry = default_registry();
    registry.register(Arc::new(MemoryLookupTool::new(memory)));
    registry
}
