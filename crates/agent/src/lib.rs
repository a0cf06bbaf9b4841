//! Explanation provider - asks a language model about a word
//!
//! This crate is the only place that knows how to talk to the model:
//! - **Prompt** (`prompt`) - fixed linguistics instructions plus the per-word request
//! - **Client** (`llm`) - OpenAI-compatible `/chat/completions` over HTTPS (DeepSeek, OpenAI, Ollama)
//! - **Analysis** (`analysis`) - splits the completion into main text, derived words, roots
//! - **Provider** (`provider`) - implements `etymo_core::ExplanationProvider`
//!
//! The model only writes prose. Whether anything is saved is decided by the
//! interaction core, never by the model.

pub mod analysis;
pub mod llm;
pub mod prompt;
pub mod provider;

pub use llm::{ChatMessage, ChatRequest, LlmClient, LlmError, OpenAiCompatibleClient};
pub use provider::ModelExplanationProvider;
