//! Chat types and the LLM collaborator traits.
//!
//! The pipeline talks to one LLM endpoint for four distinct jobs:
//! preference extraction, activity/season classification, chunk
//! compression, and the grounded RAG answer. All of them go through the
//! same `LlmClient::complete` call; extraction and compression run at
//! temperature 0.0 so repeated runs stay deterministic, only the final
//! free-form answer uses a higher temperature.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (fixed prompts)
    System,
    /// The end user (or pipeline-assembled content)
    User,
    /// The model
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// The LLM completion collaborator.
///
/// Implementations: the OpenAI-compatible HTTP client in `kurort-llm`,
/// scripted mocks in tests.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// A human-readable name for this client (e.g. "openai-compat", "mock").
    fn name(&self) -> &str;

    /// Send a conversation and return the generated text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> std::result::Result<String, LlmError>;
}

/// Exact token counting for budget arithmetic.
///
/// Budget math is only correct when counts come from the same tokenizer
/// the target model uses; approximate character heuristics belong in
/// tests, not production.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}
