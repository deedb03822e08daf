//! Error types for the Kurort domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Kurort operations.
///
/// Pipeline failures propagate as this type; the boundary layer (CLI)
/// decides how to present them. No null sentinels.
#[derive(Debug, Error)]
pub enum Error {
    // --- Content/POI source errors ---
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    // --- LLM errors ---
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    // --- Embedding errors ---
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Page not found: {0}")]
    NotFound(String),

    // The field is `origin`, not `source`: thiserror reserves `source`
    // for the error-cause chain and requires it to be an Error impl.
    #[error("Invalid payload from {origin}: {reason}")]
    InvalidPayload { origin: String, reason: String },

    #[error("Cache storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
}

#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("Embedding backend error: {0}")]
    Backend(String),

    #[error("Embedding cache error: {0}")]
    Cache(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Embedder not configured: {0}")]
    NotConfigured(String),
}

impl SourceError {
    /// Whether a retry could plausibly succeed. Missing pages and
    /// malformed payloads stay broken on retry; transport does not.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl LlmError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Authentication failures are permanent; rate limits, timeouts and
    /// network hiccups are worth another attempt.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::Tokenizer(_) => false,
        }
    }
}
