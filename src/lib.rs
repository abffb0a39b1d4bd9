//! ```text
//! PDF file ──► loader::PdfLoader ──────► Vec<Page>
//!                                           │
//! Pages ──► splitter::WindowSplitter ──► Vec<Chunk>
//!                                           │
//! Chunk texts ──► embedder::Embedder ──► Vec<Vec<f32>>
//!                                           │
//! (chunk, vector) pairs ──► stores::VectorStore ──► chunks.sqlite
//!
//! Stored vectors ──► pipeline::IngestionPipeline::query ──► ranked chunks
//! ```
//!
//! The [`pipeline::IngestionPipeline`] drives the four stages above in
//! sequence. Loader, embedder, and store sit behind narrow async traits so
//! the pipeline can run against fakes in tests and against a local Ollama
//! endpoint plus a sqlite-vec database in production.

pub mod config;
pub mod embedder;
pub mod loader;
pub mod pipeline;
pub mod splitter;
pub mod stores;
pub mod types;

pub use config::PipelineConfig;
pub use embedder::{Embedder, MockEmbedder, OllamaEmbedder};
pub use loader::{DocumentLoader, Page, PdfLoader};
pub use pipeline::{IngestReport, IngestionPipeline, ScoredChunk};
pub use splitter::{Chunk, WindowSplitter};
pub use stores::{ChunkRecord, VectorStore, sqlite::SqliteVectorStore};
pub use types::RagError;
