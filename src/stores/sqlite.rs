//! SQLite vector store backed by the sqlite-vec extension.
//!
//! Chunk rows live in an ordinary `chunks` table; their vectors live in a
//! `chunks_embeddings` vec0 virtual table joined by rowid. The virtual table
//! is created on first insert, with the dimension of the incoming vectors.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::sync::Once;

use tokio_rusqlite::{Connection, ffi};

use super::{ChunkRecord, VectorStore};
use crate::types::RagError;
use async_trait::async_trait;

/// On-disk vector store persisting to `<dir>/chunks.sqlite`.
#[derive(Clone)]
pub struct SqliteVectorStore {
    conn: Connection,
    db_path: PathBuf,
}

impl SqliteVectorStore {
    pub const DB_FILE: &'static str = "chunks.sqlite";

    /// Opens (or creates) the store under the given directory.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, RagError> {
        Self::register_sqlite_vec()?;

        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|err| RagError::storage(format!("{}: {}", dir.display(), err)))?;
        let db_path = dir.join(Self::DB_FILE);

        let conn = Connection::open(&db_path)
            .await
            .map_err(|err| RagError::storage(err.to_string()))?;

        // Probe the extension so a broken registration fails at open time,
        // not on the first insert.
        conn.call(|conn| -> tokio_rusqlite::Result<()> {
            match conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0)) {
                Ok(_) => Ok(()),
                Err(err) => Err(tokio_rusqlite::Error::Error(err)),
            }
        })
        .await
        .map_err(|err| RagError::storage(err.to_string()))?;

        conn.call(|conn| -> tokio_rusqlite::Result<()> {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS chunks (
                    id TEXT PRIMARY KEY,
                    source TEXT,
                    page_number INTEGER,
                    chunk_index INTEGER,
                    start_offset INTEGER,
                    content TEXT,
                    metadata TEXT
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source)",
                [],
            )?;
            Ok(())
        })
        .await
        .map_err(|err| RagError::storage(err.to_string()))?;

        Ok(Self { conn, db_path })
    }

    /// Path of the underlying database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn register_sqlite_vec() -> Result<(), RagError> {
        use std::sync::Mutex;

        static INIT: Once = Once::new();
        static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

        INIT.call_once(|| {
            let result = unsafe {
                type SqliteExtensionInit = unsafe extern "C" fn(
                    *mut ffi::sqlite3,
                    *mut *mut c_char,
                    *const ffi::sqlite3_api_routines,
                ) -> i32;

                let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
                let init_fn: SqliteExtensionInit =
                    transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
                let rc = ffi::sqlite3_auto_extension(Some(init_fn));
                if rc != 0 {
                    Err(format!(
                        "failed to register sqlite-vec extension (code {rc})"
                    ))
                } else {
                    Ok(())
                }
            };
            *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
        });

        INIT_RESULT
            .lock()
            .expect("init result mutex poisoned")
            .clone()
            .expect("init was called but result not set")
            .map_err(RagError::Storage)
    }

    async fn ensure_embeddings_table(&self, dims: usize) -> Result<(), RagError> {
        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<()> {
                let exists: i64 = conn.query_row(EMBEDDINGS_TABLE_PROBE, [], |row| row.get(0))?;
                if exists == 0 {
                    conn.execute(
                        &format!(
                            "CREATE VIRTUAL TABLE chunks_embeddings USING vec0(embedding float[{dims}])"
                        ),
                        [],
                    )?;
                }
                Ok(())
            })
            .await
            .map_err(|err| RagError::storage(err.to_string()))
    }
}

const EMBEDDINGS_TABLE_PROBE: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'chunks_embeddings'";

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn insert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut rows = Vec::with_capacity(chunks.len());
        let mut dims = 0usize;
        for record in chunks {
            let Some(embedding) = record.embedding else {
                return Err(RagError::storage(format!(
                    "chunk {} has no embedding",
                    record.id
                )));
            };
            if dims == 0 {
                dims = embedding.len();
            }
            let embedding_json = serde_json::to_string(&embedding)
                .map_err(|err| RagError::storage(err.to_string()))?;
            rows.push((
                record.id,
                record.source,
                record.page_number as i64,
                record.chunk_index as i64,
                record.start_offset as i64,
                record.content,
                record.metadata.to_string(),
                embedding_json,
            ));
        }
        if dims == 0 {
            return Err(RagError::storage("embeddings have zero dimensions"));
        }

        self.ensure_embeddings_table(dims).await?;

        let inserted = rows.len();
        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<()> {
                let tx = conn.transaction()?;
                for (id, source, page_number, chunk_index, start_offset, content, metadata, embedding_json) in
                    rows
                {
                    tx.execute(
                        "INSERT INTO chunks (id, source, page_number, chunk_index, start_offset, content, metadata)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        (&id, &source, page_number, chunk_index, start_offset, &content, &metadata),
                    )?;
                    let rowid = tx.last_insert_rowid();
                    tx.execute(
                        "INSERT INTO chunks_embeddings (rowid, embedding) VALUES (?1, ?2)",
                        (rowid, &embedding_json),
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|err| RagError::storage(err.to_string()))?;

        tracing::debug!(chunks = inserted, "inserted chunk batch");
        Ok(())
    }

    async fn search_similar(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>, RagError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let embedding_json = serde_json::to_string(query_embedding)
            .map_err(|err| RagError::storage(err.to_string()))?;

        self.conn
            .call(move |conn| -> tokio_rusqlite::Result<Vec<(ChunkRecord, f32)>> {
                let exists: i64 = conn.query_row(EMBEDDINGS_TABLE_PROBE, [], |row| row.get(0))?;
                if exists == 0 {
                    return Ok(Vec::new());
                }

                let mut stmt = conn.prepare(&format!(
                    "SELECT c.id, c.source, c.page_number, c.chunk_index, c.start_offset, \
                            c.content, c.metadata, \
                            vec_distance_cosine(e.embedding, vec_f32(?1)) AS distance \
                     FROM chunks c \
                     JOIN chunks_embeddings e ON e.rowid = c.rowid \
                     ORDER BY distance ASC \
                     LIMIT {top_k}"
                ))?;

                let rows = stmt.query_map([&embedding_json], |row| {
                    let metadata: String = row.get(6)?;
                    let record = ChunkRecord {
                        id: row.get(0)?,
                        source: row.get(1)?,
                        page_number: row.get::<_, i64>(2)? as usize,
                        chunk_index: row.get::<_, i64>(3)? as usize,
                        start_offset: row.get::<_, i64>(4)? as usize,
                        content: row.get(5)?,
                        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
                        embedding: None,
                    };
                    let distance: f32 = row.get(7)?;
                    // Cosine distance in [0, 2]; report similarity instead.
                    Ok((record, 1.0 - distance))
                })?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| RagError::storage(err.to_string()))
    }

    async fn count(&self) -> Result<usize, RagError> {
        self.conn
            .call(|conn| -> tokio_rusqlite::Result<usize> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| RagError::storage(err.to_string()))
    }
}
