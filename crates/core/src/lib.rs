//! Core domain types and traits for Kurort — the resort-city travel advisor.
//!
//! This crate defines the value objects that flow through the ranking
//! pipeline (city content, chunks, documents, ranked results) and the
//! collaborator traits the pipeline depends on (LLM completion, text
//! embedding, content and POI sources, token counting). Implementations
//! live in the sibling crates; everything here is dependency-light so any
//! crate can use these types without pulling in HTTP or ML stacks.

pub mod chat;
pub mod content;
pub mod embedding;
pub mod error;

pub use chat::{ChatMessage, LlmClient, Role, TokenCounter};
pub use content::{Chunk, CityContent, CityPois, ContentSource, Document, PoiRecord, PoiSource, RankedCity};
pub use embedding::TextEmbedder;
pub use error::{EmbeddingError, Error, LlmError, Result, SourceError};
