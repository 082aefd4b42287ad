//! LLM client for the contract swarm.
//!
//! Provides the `ProviderAdapter` trait, a middleware chain, the OpenAI
//! chat-completions adapter, and `LlmClient` for routing requests to a
//! registered provider.

mod client;
mod openai;
mod provider;
mod types;

pub use client::*;
pub use openai::OpenAiAdapter;
pub use provider::*;
pub use types::*;
