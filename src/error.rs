//! Error types for the document Q&A engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
///
/// Each variant is a distinct failure class so callers can map them to
/// appropriate user-facing responses: `Provider`/`Timeout` mean the backing
/// model service is broken or slow, `RateLimit` is retryable at the caller's
/// discretion, `InvalidQuery` is user error.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable credential or provider configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Bad chunking parameters (overlap >= chunk_size, zero chunk size)
    #[error("invalid chunking configuration: {0}")]
    InvalidConfig(String),

    /// File format with no extractor
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Text extraction failed for a supported format
    #[error("failed to extract text from '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Empty input where at least one element is required
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Network or auth failure talking to the embedding or chat endpoint
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider throttled the request; caller decides whether to retry
    #[error("provider rate limit: {0}")]
    RateLimit(String),

    /// A network-bound step exceeded its time budget
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The vector index backing storage cannot be reached
    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),

    /// The background processing queue rejected a submission
    #[error("processing queue error: {0}")]
    Queue(String),

    /// Empty or otherwise unanswerable question
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
