//! End-to-end demo: ingest a PDF into a sqlite-vec store, then run a query.
//!
//! ```bash
//! RAGMILL_DOC=./cat_breeds.pdf cargo run --example ingest_and_query
//! ```
//!
//! Environment variables:
//! - `RAGMILL_DOC`    — path to the PDF to ingest (required)
//! - `RAGMILL_STORE`  — store directory (default `./ragmill_store`)
//! - `RAGMILL_OLLAMA` — Ollama base URL; when unset a deterministic mock
//!   embedder is used so the demo runs offline
//! - `RAGMILL_MODEL`  — embedding model name (default `nomic-embed-text`)
//! - `RAGMILL_QUERY`  — optional query text to run after ingestion
//! - `RAGMILL_TOP_K`  — number of results for the query (default 3)

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing_subscriber::FmtSubscriber;

use ragmill::{
    Embedder, IngestionPipeline, MockEmbedder, OllamaEmbedder, PdfLoader, PipelineConfig,
    RagError, SqliteVectorStore, VectorStore,
};

#[tokio::main]
async fn main() -> Result<(), RagError> {
    init_tracing();

    let Some(document_path) = env::var("RAGMILL_DOC").ok().map(PathBuf::from) else {
        eprintln!("RAGMILL_DOC must point at the PDF to ingest");
        std::process::exit(2);
    };
    let store_path = env::var("RAGMILL_STORE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./ragmill_store"));
    let model = env::var("RAGMILL_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string());

    let embedder: Arc<dyn Embedder> = match env::var("RAGMILL_OLLAMA") {
        Ok(base_url) => Arc::new(OllamaEmbedder::with_base_url(base_url, &model)?),
        Err(_) => {
            println!("RAGMILL_OLLAMA not set, using the mock embedder");
            Arc::new(MockEmbedder::new())
        }
    };

    let store = Arc::new(SqliteVectorStore::open(&store_path).await?);
    let pipeline = IngestionPipeline::builder()
        .config(PipelineConfig::new(&document_path, &store_path).with_embedding_model(&model))
        .loader(Arc::new(PdfLoader::new()))
        .embedder(embedder)
        .store(store.clone())
        .build();

    let start = Instant::now();
    let report = pipeline.ingest().await?;

    println!("\n✅ Ingestion complete!");
    println!("  document      : {}", report.document);
    println!("  pages loaded  : {}", report.page_count);
    println!("  chunks stored : {}", report.chunk_count);
    println!("  store total   : {}", store.count().await?);
    println!("  database      : {}", store.db_path().display());
    println!("  duration      : {:.2?}", start.elapsed());

    if let Ok(query) = env::var("RAGMILL_QUERY") {
        let top_k = env::var("RAGMILL_TOP_K")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(3);

        println!("\n→ Querying: {query}");
        for (rank, hit) in pipeline.query(&query, top_k).await?.iter().enumerate() {
            let preview: String = hit.record.content.chars().take(80).collect();
            println!(
                "  {}. [score {:.3}] (page {}) {}",
                rank + 1,
                hit.score,
                hit.record.page_number,
                preview
            );
        }
    }

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
