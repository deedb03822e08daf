//! Embedding backends, persistent vector cache and similarity ranking.
//!
//! # Structure
//! - `api` — OpenAI-compatible `/embeddings` backend (default path)
//! - `bert` — local ruBERT inference via Candle (behind the `local` feature)
//! - `cache` — persistent append-only JSONL vector cache, batch-flushed
//! - `service` — cache-aware batch embedding front door
//! - `similarity` — cosine similarity and boosted city ranking

pub mod api;
#[cfg(feature = "local")]
pub mod bert;
pub mod cache;
pub mod service;
pub mod similarity;

pub use api::ApiEmbedder;
#[cfg(feature = "local")]
pub use bert::BertEmbedder;
pub use cache::EmbeddingCache;
pub use service::EmbeddingService;
pub use similarity::{RankOptions, cosine_similarity, rank_cities};
