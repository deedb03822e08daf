//! LLM interaction layer for the Kurort pipeline.
//!
//! # Structure
//! - `client` — OpenAI-compatible chat client with bounded retry
//! - `budget` — context/token budget arithmetic and exact tokenization
//! - `prompts` — the fixed system prompts
//! - `extract` — preference extraction and constrained classification
//! - `summarize` — chunk compression and RAG document assembly
//! - `rag` — two-phase grounded answering

pub mod budget;
pub mod client;
pub mod extract;
pub mod prompts;
pub mod rag;
pub mod summarize;

pub use budget::{
    CONTEXT_LENGTH, ContextBudget, HfTokenCounter, MAX_FINAL_TOKENS, MAX_SUMMARY_TOKENS,
    RESERVED_OUTPUT_TOKENS,
};
pub use client::OpenAiClient;
pub use extract::{classify_activity, classify_season, extract_preferences, merge_activity};
pub use rag::{GroundedAnswer, RagResponder};
pub use summarize::Summarizer;

#[cfg(test)]
pub(crate) mod test_helpers;
