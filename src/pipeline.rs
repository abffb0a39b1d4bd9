//! Pipeline driver: load → split → embed → store, plus similarity queries.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::embedder::Embedder;
use crate::loader::DocumentLoader;
use crate::splitter::WindowSplitter;
use crate::stores::{ChunkRecord, VectorStore};
use crate::types::RagError;

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Source document path as recorded in the store.
    pub document: String,
    /// Number of pages loaded from the document.
    pub page_count: usize,
    /// Number of chunks embedded and inserted.
    pub chunk_count: usize,
}

/// A stored chunk paired with its similarity to a query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub record: ChunkRecord,
    pub score: f32,
}

/// Drives the ingestion stages in sequence.
///
/// Each stage completes fully before the next begins. Ingestion is not
/// idempotent: repeated calls for the same document append duplicate entries,
/// and there is no rollback across collaborators — if the store fails after
/// embedding succeeded, the caller decides whether to retry the whole run.
pub struct IngestionPipeline {
    config: PipelineConfig,
    loader: Arc<dyn DocumentLoader>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    pub fn new(
        config: PipelineConfig,
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            config,
            loader,
            embedder,
            store,
        }
    }

    /// Create a new builder for constructing an `IngestionPipeline`.
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingests the configured document and reports how many chunks were
    /// embedded and stored.
    pub async fn ingest(&self) -> Result<IngestReport, RagError> {
        self.config.validate()?;
        let splitter = WindowSplitter::new(self.config.chunk_size, self.config.chunk_overlap)?;

        let document = self.config.document_path.display().to_string();
        tracing::info!(document = %document, "starting ingestion");

        let pages = self.loader.load(&self.config.document_path).await?;
        let page_count = pages.len();

        let chunks = splitter.split_pages(&pages);
        if chunks.is_empty() {
            tracing::warn!(document = %document, "document produced no chunks");
            return Ok(IngestReport {
                document,
                page_count,
                chunk_count: 0,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::embedding(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (chunk, embedding))| {
                ChunkRecord::new(
                    Uuid::new_v4().to_string(),
                    document.clone(),
                    chunk.page_number,
                    index,
                    chunk.start_offset,
                    chunk.text,
                )
                .with_metadata(json!({
                    "page_number": chunk.page_number,
                    "start_offset": chunk.start_offset,
                    "embedding_model": self.embedder.model(),
                }))
                .with_embedding(embedding)
            })
            .collect();

        let chunk_count = records.len();
        self.store.insert_chunks(records).await?;

        tracing::info!(
            document = %document,
            pages = page_count,
            chunks = chunk_count,
            "ingestion complete"
        );
        Ok(IngestReport {
            document,
            page_count,
            chunk_count,
        })
    }

    /// Embeds the query text and returns the `top_k` most similar stored
    /// chunks, ranked most similar first.
    pub async fn query(&self, query_text: &str, top_k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        let texts = vec![query_text.to_string()];
        let mut embeddings = self.embedder.embed_batch(&texts).await?;
        let query_embedding = embeddings
            .pop()
            .ok_or_else(|| RagError::embedding("embedder returned no vector for the query"))?;

        let hits = self.store.search_similar(&query_embedding, top_k).await?;
        tracing::debug!(results = hits.len(), top_k, "similarity search complete");
        Ok(hits
            .into_iter()
            .map(|(record, score)| ScoredChunk { record, score })
            .collect())
    }
}

/// Builder for constructing [`IngestionPipeline`] instances.
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    config: Option<PipelineConfig>,
    loader: Option<Arc<dyn DocumentLoader>>,
    embedder: Option<Arc<dyn Embedder>>,
    store: Option<Arc<dyn VectorStore>>,
}

impl IngestionPipelineBuilder {
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the pipeline.
    ///
    /// # Panics
    ///
    /// Panics if any component was not provided.
    pub fn build(self) -> IngestionPipeline {
        IngestionPipeline {
            config: self.config.expect("IngestionPipelineBuilder requires a config"),
            loader: self.loader.expect("IngestionPipelineBuilder requires a loader"),
            embedder: self
                .embedder
                .expect("IngestionPipelineBuilder requires an embedder"),
            store: self.store.expect("IngestionPipelineBuilder requires a store"),
        }
    }

    /// Build the pipeline, returning `None` if any component is missing.
    pub fn try_build(self) -> Option<IngestionPipeline> {
        Some(IngestionPipeline {
            config: self.config?,
            loader: self.loader?,
            embedder: self.embedder?,
            store: self.store?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_every_component() {
        assert!(IngestionPipelineBuilder::default().try_build().is_none());
        let partial = IngestionPipeline::builder().config(PipelineConfig::new("a.pdf", "store"));
        assert!(partial.try_build().is_none());
    }
}
