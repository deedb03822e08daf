//! The text-embedding collaborator trait.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Converts text to fixed-dimension vectors.
///
/// This is the single most expensive operation in the pipeline, so the
/// contract is batch-first: implementations encode all inputs together
/// (padded batch for local models, one API call for remote ones). The
/// model is assumed deterministic: identical input text must yield an
/// identical vector, which is what makes the persistent cache sound.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// A human-readable name for this backend (e.g. "api", "rubert").
    fn name(&self) -> &str;

    /// Embed all texts in one batch. The result has exactly one vector
    /// per input, in input order.
    async fn embed_batch(
        &self,
        texts: &[String],
    ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError>;
}
