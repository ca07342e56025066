//! LLM integration for the describe-then-extract tagging strategy.
//!
//! Provides a provider abstraction (implemented for Ollama) and the
//! deadline-bounded retry used while waiting for a non-empty description.

pub(crate) mod ollama;
pub(crate) mod provider;
pub(crate) mod retry;

pub use ollama::OllamaProvider;
pub use provider::{ImageInput, LlmProvider, LlmRequest, LlmResponse};
