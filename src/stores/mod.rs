//! Storage backends for embedded chunks.
//!
//! The [`VectorStore`] trait abstracts the persistence layer so the pipeline
//! can run against fakes in tests and a sqlite-vec database in production.
//! Entries are immutable once inserted; the store enforces no deduplication,
//! so re-ingesting a document appends duplicate entries.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

pub use sqlite::SqliteVectorStore;

/// A chunk with its embedding, ready for storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier for this chunk.
    pub id: String,
    /// Source document path.
    pub source: String,
    /// Page the chunk was cut from (1-indexed).
    pub page_number: usize,
    /// Zero-based index of the chunk within the whole document.
    pub chunk_index: usize,
    /// Character offset of the chunk within its page.
    pub start_offset: usize,
    /// The chunk text.
    pub content: String,
    /// Additional metadata as JSON.
    pub metadata: serde_json::Value,
    /// The embedding vector (if computed).
    pub embedding: Option<Vec<f32>>,
}

impl ChunkRecord {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        page_number: usize,
        chunk_index: usize,
        start_offset: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            page_number,
            chunk_index,
            start_offset,
            content: content.into(),
            metadata: serde_json::Value::Object(Default::default()),
            embedding: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Persistence layer for (vector, text, metadata) entries.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Appends a batch of records to the store.
    ///
    /// Every record must carry an embedding; the batch is written atomically
    /// with respect to this call.
    async fn insert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError>;

    /// Returns the `top_k` entries nearest to the query embedding, most
    /// similar first, paired with a similarity score.
    async fn search_similar(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>, RagError>;

    /// Total number of entries in the store.
    async fn count(&self) -> Result<usize, RagError>;
}
