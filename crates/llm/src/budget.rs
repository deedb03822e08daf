//! Context/token budget arithmetic.
//!
//! The budget models a fixed total context length shared by the prompt
//! and the generated output. The two fixed system prompts are counted
//! once at construction; `available_tokens` can go negative, which
//! callers must treat as "insufficient budget, compress first".

use std::sync::Arc;

use tokenizers::Tokenizer;
use tracing::debug;

use kurort_core::{LlmError, TokenCounter};

use crate::prompts::{GROUNDED_SYSTEM_PROMPT, SYSTEM_PROMPT};

/// Total model context length (input + output) in tokens.
pub const CONTEXT_LENGTH: usize = 10_000;
/// Tokens reserved for the expected generation length.
pub const RESERVED_OUTPUT_TOKENS: usize = 2_048;
/// Cap for intermediate summaries and the relevant-passages call.
pub const MAX_SUMMARY_TOKENS: u32 = 512;
/// Cap for the final free-form answer.
pub const MAX_FINAL_TOKENS: u32 = 1_024;

/// Precomputed token budget for one model/tokenizer pair.
#[derive(Clone)]
pub struct ContextBudget {
    counter: Arc<dyn TokenCounter>,
    context_length: usize,
    base_prompt_tokens: usize,
    rag_prompt_tokens: usize,
    reserved_output_tokens: usize,
}

impl ContextBudget {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        let base_prompt_tokens = counter.count(SYSTEM_PROMPT);
        let rag_prompt_tokens = counter.count(GROUNDED_SYSTEM_PROMPT);
        debug!(base_prompt_tokens, rag_prompt_tokens, "context budget initialized");
        Self {
            counter,
            context_length: CONTEXT_LENGTH,
            base_prompt_tokens,
            rag_prompt_tokens,
            reserved_output_tokens: RESERVED_OUTPUT_TOKENS,
        }
    }

    #[cfg(test)]
    fn with_context_length(mut self, context_length: usize) -> Self {
        self.context_length = context_length;
        self
    }

    pub fn count(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    /// Tokens left for document content after the system prompt, the
    /// given text and the reserved output allowance. Negative means the
    /// budget is already blown.
    pub fn available_tokens(&self, text: &str, is_rag: bool) -> i64 {
        let prompt = if is_rag { self.rag_prompt_tokens } else { self.base_prompt_tokens };
        self.context_length as i64
            - prompt as i64
            - self.counter.count(text) as i64
            - self.reserved_output_tokens as i64
    }
}

/// Token counter backed by the target model's own tokenizer.
///
/// Budget arithmetic is only correct with the exact tokenizer the model
/// uses; this downloads `tokenizer.json` from HuggingFace Hub on first
/// construction (cached by hf-hub afterwards).
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
}

impl HfTokenCounter {
    /// Load the tokenizer for a Hub model repo. Blocking; call once at
    /// startup (wrap in `spawn_blocking` from async contexts).
    pub fn from_pretrained(repo: &str) -> Result<Self, LlmError> {
        let api = hf_hub::api::sync::Api::new().map_err(|e| {
            LlmError::Tokenizer(format!("failed to initialize HuggingFace Hub API: {e}"))
        })?;
        let path = api.model(repo.to_string()).get("tokenizer.json").map_err(|e| {
            LlmError::Tokenizer(format!("failed to download tokenizer from '{repo}': {e}"))
        })?;
        Self::from_file(&path)
    }

    /// Load a tokenizer from a local `tokenizer.json`.
    pub fn from_file(path: &std::path::Path) -> Result<Self, LlmError> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| LlmError::Tokenizer(format!("failed to load tokenizer: {e}")))?;
        Ok(Self { tokenizer })
    }
}

impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> usize {
        self.tokenizer
            .encode(text, false)
            .map(|encoding| encoding.get_ids().len())
            .unwrap_or(0)
    }
}
