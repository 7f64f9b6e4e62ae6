//! LLM Provider implementations for Harkaam.
//!
//! All providers implement the `harkaam_core::Provider` trait.
//! The router resolves `provider:model` references to the right backend.

pub mod anthropic;
mod http;
pub mod openai_compat;
pub mod router;

pub use anthropic::AnthropicProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
