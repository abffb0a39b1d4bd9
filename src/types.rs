//! Shared error taxonomy for the ingestion pipeline.

use thiserror::Error;

/// Errors surfaced by pipeline stages and their collaborators.
///
/// Every variant carries a rendered message rather than a source chain; the
/// pipeline never retries or recovers internally, so callers only need the
/// failure class and a human-readable cause.
#[derive(Debug, Clone, Error)]
pub enum RagError {
    /// Source document is missing, unreadable, or not a valid PDF.
    #[error("document error: {0}")]
    Document(String),

    /// Invalid pipeline configuration (chunk size/overlap).
    #[error("configuration error: {0}")]
    Config(String),

    /// Embedding endpoint unreachable or returned an error.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Vector store insertion or persistence failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem error outside of document parsing.
    #[error("io error: {0}")]
    Io(String),
}

impl RagError {
    /// Document error naming the offending path.
    pub fn document(path: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::Document(format!("{}: {}", path, message.into()))
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

impl From<std::io::Error> for RagError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        Self::Embedding(err.to_string())
    }
}
