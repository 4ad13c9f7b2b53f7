//! sous-ai: LLM and web search adapters
//!
//! This crate wraps the external services the recipe assistant depends on:
//! chat-completion providers (OpenAI-compatible and Anthropic) behind the
//! [`providers::LlmProvider`] trait, and web search behind
//! [`search::SearchProvider`].

pub mod error;
pub mod models;
pub mod providers;
pub mod search;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use providers::LlmProvider;
pub use search::{Locale, SearchProvider, SearchResult};
pub use stream::MessageEventStream;
pub use types::*;
