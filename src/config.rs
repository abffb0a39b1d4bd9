//! Pipeline configuration.
//!
//! The original tool resolved its document and persistence locations from
//! hard-coded paths; here they are explicit fields on [`PipelineConfig`],
//! injected into the driver alongside the embedding model name and the
//! splitter parameters.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::RagError;

/// Default maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default embedding model served by a local Ollama endpoint.
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Everything the ingestion pipeline needs to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Source document to ingest.
    pub document_path: PathBuf,
    /// Directory where the vector store persists its database.
    pub store_path: PathBuf,
    /// Embedding model name, forwarded to the embedder.
    pub embedding_model: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of the same page.
    pub chunk_overlap: usize,
}

impl PipelineConfig {
    /// Creates a configuration with default chunking parameters and model.
    pub fn new(document_path: impl Into<PathBuf>, store_path: impl Into<PathBuf>) -> Self {
        Self {
            document_path: document_path.into(),
            store_path: store_path.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    #[must_use]
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Validates the chunking parameters.
    ///
    /// The overlap must be strictly smaller than the chunk size, otherwise
    /// the window start would never advance.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::config("chunk_size must be greater than zero"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::new("doc.pdf", "store");
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.chunk_overlap, DEFAULT_CHUNK_OVERLAP);
        assert_eq!(config.embedding_model, DEFAULT_EMBEDDING_MODEL);
        config.validate().unwrap();
    }

    #[test]
    fn overlap_equal_to_size_is_rejected() {
        let config = PipelineConfig::new("doc.pdf", "store")
            .with_chunk_size(100)
            .with_chunk_overlap(100);
        assert!(matches!(config.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn overlap_above_size_is_rejected() {
        let config = PipelineConfig::new("doc.pdf", "store")
            .with_chunk_size(100)
            .with_chunk_overlap(150);
        assert!(matches!(config.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let config = PipelineConfig::new("doc.pdf", "store").with_chunk_size(0);
        assert!(matches!(config.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn round_trips_through_json() {
        let config = PipelineConfig::new("doc.pdf", "store").with_chunk_size(512);
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chunk_size, 512);
        assert_eq!(back.document_path, config.document_path);
    }
}
