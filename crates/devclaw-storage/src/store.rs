//! The chunk store.
//!
//! Owns the database handle and the in-memory vector cache. Retrieval holds
//! a shared reference to the store, never ownership of the connection.
//!
//! Delta indexing: re-indexing a file whose hash is unchanged is a no-op
//! (zero provider calls, `indexed_at` untouched). Otherwise chunk hashes
//! already present for the file keep their prior embedding, new hashes go
//! through the embedding cache, and only the remainder hits the provider.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use devclaw_core::errors::{DevclawResult, StorageError};
use devclaw_core::hash::content_hash;
use devclaw_core::traits::EmbeddingProvider;

use crate::embedding_cache::{self, blob_to_vector, vector_to_blob};
use crate::{db_err, pragmas, schema};

/// One embedded chunk held in the in-memory vector cache.
#[derive(Debug, Clone)]
pub struct VectorCacheEntry {
    pub chunk_id: i64,
    pub file_id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A row from the `files` table.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub file_id: String,
    pub hash: String,
    pub indexed_at: String,
}

/// Aggregate store counters.
#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub files: usize,
    pub chunks: usize,
    pub embedded_chunks: usize,
    pub fts_available: bool,
}

/// SQLite-backed chunk store with an in-memory vector cache.
pub struct ChunkStore {
    conn: Mutex<Connection>,
    fts_available: bool,
    /// Snapshot of all embedded chunks. Readers clone the `Arc`; `refresh`
    /// replaces the whole vector under the write lock.
    vectors: RwLock<Arc<Vec<VectorCacheEntry>>>,
}

impl ChunkStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> DevclawResult<Self> {
        let conn = Connection::open(path).map_err(|e| db_err("open", e))?;
        Self::init(conn)
    }

    /// Open an in-memory store (tests).
    pub fn open_in_memory() -> DevclawResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| db_err("open", e))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> DevclawResult<Self> {
        pragmas::apply_pragmas(&conn)?;
        schema::create_tables(&conn)?;
        let fts_available = schema::create_fts(&conn);

        let store = Self {
            conn: Mutex::new(conn),
            fts_available,
            vectors: RwLock::new(Arc::new(Vec::new())),
        };
        store.refresh_vector_cache()?;

        info!(fts = fts_available, "chunk store opened");
        Ok(store)
    }

    /// Whether the FTS5 index is provisioned. False means LIKE fallback.
    pub fn fts_available(&self) -> bool {
        self.fts_available
    }

    fn conn(&self) -> DevclawResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::db("lock", "connection mutex poisoned").into())
    }

    /// Stored content hash for a file, if it has been indexed.
    pub fn file_hash(&self, file_id: &str) -> DevclawResult<Option<String>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT hash FROM files WHERE file_id = ?1",
            params![file_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| db_err("file_hash", e))
    }

    /// Index a file's chunks, replacing any prior chunks atomically.
    ///
    /// Matching file hash returns immediately without touching the provider
    /// or `indexed_at`. Embedding failures degrade: chunks are inserted
    /// without vectors and keyword search carries them.
    pub async fn index_chunks(
        &self,
        file_id: &str,
        texts: &[String],
        file_hash: &str,
        provider: &dyn EmbeddingProvider,
    ) -> DevclawResult<()> {
        let texts: Vec<&String> = texts.iter().filter(|t| !t.trim().is_empty()).collect();
        let hashes: Vec<String> = texts.iter().map(|t| content_hash(t)).collect();

        // Read pass: no-op check, prior embeddings, cache hits.
        let mut resolved: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut missing: Vec<usize> = Vec::new();
        {
            let conn = self.conn()?;
            let existing: Option<String> = conn
                .query_row(
                    "SELECT hash FROM files WHERE file_id = ?1",
                    params![file_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| db_err("index_chunks", e))?;
            if existing.as_deref() == Some(file_hash) {
                debug!(file_id, "file hash unchanged, skipping re-index");
                return Ok(());
            }

            let mut stmt = conn
                .prepare("SELECT hash, embedding FROM chunks WHERE file_id = ?1")
                .map_err(|e| db_err("index_chunks", e))?;
            let rows = stmt
                .query_map(params![file_id], |row| {
                    let hash: String = row.get(0)?;
                    let blob: Option<Vec<u8>> = row.get(1)?;
                    Ok((hash, blob))
                })
                .map_err(|e| db_err("index_chunks", e))?;
            let mut prior: HashMap<String, Option<Vec<f32>>> = HashMap::new();
            for row in rows {
                let (hash, blob) = row.map_err(|e| db_err("index_chunks", e))?;
                prior.insert(hash, blob.map(|b| blob_to_vector(&b)));
            }

            for (i, hash) in hashes.iter().enumerate() {
                if let Some(prior_embedding) = prior.get(hash) {
                    resolved[i] = prior_embedding.clone();
                } else if let Some(cached) =
                    embedding_cache::get(&conn, hash, provider.name(), provider.model())?
                {
                    resolved[i] = Some(cached);
                } else {
                    missing.push(i);
                }
            }
        }

        // Provider pass, outside the connection lock.
        let mut fresh: Vec<usize> = Vec::new();
        if !missing.is_empty() && provider.is_enabled() {
            let batch: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            match provider.embed(&batch).await {
                Ok(vectors) if vectors.len() == batch.len() => {
                    for (&i, vector) in missing.iter().zip(vectors) {
                        if !vector.is_empty() {
                            resolved[i] = Some(vector);
                            fresh.push(i);
                        }
                    }
                }
                Ok(vectors) => {
                    warn!(
                        file_id,
                        expected = batch.len(),
                        got = vectors.len(),
                        "provider returned wrong embedding count, indexing without vectors"
                    );
                }
                Err(e) => {
                    warn!(file_id, error = %e, "embedding failed, indexing chunks without vectors");
                }
            }
        }

        // Write pass: one transaction, abort leaves no side effects.
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction().map_err(|e| db_err("index_chunks", e))?;
            let now = Utc::now().to_rfc3339();

            tx.execute(
                "INSERT INTO files (file_id, hash, indexed_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(file_id)
                 DO UPDATE SET hash = excluded.hash, indexed_at = excluded.indexed_at",
                params![file_id, file_hash, now],
            )
            .map_err(|e| db_err("index_chunks", e))?;

            tx.execute("DELETE FROM chunks WHERE file_id = ?1", params![file_id])
                .map_err(|e| db_err("index_chunks", e))?;

            for (idx, text) in texts.iter().enumerate() {
                let blob = resolved[idx].as_deref().map(vector_to_blob);
                tx.execute(
                    "INSERT INTO chunks (file_id, chunk_idx, text, hash, embedding, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![file_id, idx as i64, text, hashes[idx], blob, now],
                )
                .map_err(|e| db_err("index_chunks", e))?;
            }

            for &i in &fresh {
                if let Some(vector) = resolved[i].as_deref() {
                    embedding_cache::put(&tx, &hashes[i], provider.name(), provider.model(), vector)?;
                }
            }

            tx.commit().map_err(|e| db_err("index_chunks", e))?;
        }

        debug!(
            file_id,
            chunks = texts.len(),
            embedded = fresh.len(),
            "file indexed"
        );
        self.refresh_vector_cache()
    }

    /// Delete a file and its chunks. FTS rows go via trigger.
    pub fn remove_file(&self, file_id: &str) -> DevclawResult<()> {
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction().map_err(|e| db_err("remove_file", e))?;
            tx.execute("DELETE FROM chunks WHERE file_id = ?1", params![file_id])
                .map_err(|e| db_err("remove_file", e))?;
            tx.execute("DELETE FROM files WHERE file_id = ?1", params![file_id])
                .map_err(|e| db_err("remove_file", e))?;
            tx.commit().map_err(|e| db_err("remove_file", e))?;
        }
        self.refresh_vector_cache()
    }

    /// Rebuild the in-memory vector cache from the chunks table.
    pub fn refresh_vector_cache(&self) -> DevclawResult<()> {
        let entries = {
            let conn = self.conn()?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, file_id, text, embedding FROM chunks
                     WHERE embedding IS NOT NULL
                     ORDER BY file_id, chunk_idx",
                )
                .map_err(|e| db_err("refresh_vector_cache", e))?;
            let rows = stmt
                .query_map([], |row| {
                    let blob: Vec<u8> = row.get(3)?;
                    Ok(VectorCacheEntry {
                        chunk_id: row.get(0)?,
                        file_id: row.get(1)?,
                        text: row.get(2)?,
                        embedding: blob_to_vector(&blob),
                    })
                })
                .map_err(|e| db_err("refresh_vector_cache", e))?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row.map_err(|e| db_err("refresh_vector_cache", e))?);
            }
            entries
        };

        let mut guard = self
            .vectors
            .write()
            .map_err(|_| StorageError::db("lock", "vector cache lock poisoned"))?;
        *guard = Arc::new(entries);
        Ok(())
    }

    /// Cheap snapshot of the vector cache (shared lock, Arc clone).
    pub fn vector_snapshot(&self) -> DevclawResult<Arc<Vec<VectorCacheEntry>>> {
        self.vectors
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| StorageError::db("lock", "vector cache lock poisoned").into())
    }

    /// Run an FTS5 MATCH query. Rank is BM25-style: smaller = more relevant.
    pub fn fts_search(
        &self,
        match_expr: &str,
        limit: usize,
    ) -> DevclawResult<Vec<(String, String, f64)>> {
        if !self.fts_available {
            return Err(StorageError::SchemaUnsupported.into());
        }
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT c.file_id, c.text, chunks_fts.rank
                 FROM chunks_fts
                 JOIN chunks c ON c.id = chunks_fts.rowid
                 WHERE chunks_fts MATCH ?1
                 ORDER BY rank
                 LIMIT ?2",
            )
            .map_err(|e| db_err("fts_search", e))?;
        let rows = stmt
            .query_map(params![match_expr, limit as i64], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(|e| db_err("fts_search", e))?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| db_err("fts_search", e))?);
        }
        Ok(results)
    }

    /// LIKE fallback scan: rows whose text contains any of the words.
    /// Scoring happens in the retrieval layer.
    pub fn like_search(&self, words: &[String]) -> DevclawResult<Vec<(String, String)>> {
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let clauses: Vec<String> = (1..=words.len())
            .map(|i| format!("text LIKE ?{i} ESCAPE '\\'"))
            .collect();
        let sql = format!(
            "SELECT file_id, text FROM chunks WHERE {}",
            clauses.join(" OR ")
        );
        let patterns: Vec<String> = words.iter().map(|w| format!("%{}%", escape_like(w))).collect();

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(|e| db_err("like_search", e))?;
        let rows = stmt
            .query_map(params_from_iter(patterns.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .map_err(|e| db_err("like_search", e))?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| db_err("like_search", e))?);
        }
        Ok(results)
    }

    /// All indexed files.
    pub fn list_files(&self) -> DevclawResult<Vec<FileInfo>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT file_id, hash, indexed_at FROM files ORDER BY file_id")
            .map_err(|e| db_err("list_files", e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FileInfo {
                    file_id: row.get(0)?,
                    hash: row.get(1)?,
                    indexed_at: row.get(2)?,
                })
            })
            .map_err(|e| db_err("list_files", e))?;
        let mut files = Vec::new();
        for row in rows {
            files.push(row.map_err(|e| db_err("list_files", e))?);
        }
        Ok(files)
    }

    /// Aggregate counters.
    pub fn stats(&self) -> DevclawResult<StoreStats> {
        let conn = self.conn()?;
        let count = |sql: &str| -> DevclawResult<usize> {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n as usize)
                .map_err(|e| db_err("stats", e))
        };
        Ok(StoreStats {
            files: count("SELECT COUNT(*) FROM files")?,
            chunks: count("SELECT COUNT(*) FROM chunks")?,
            embedded_chunks: count("SELECT COUNT(*) FROM chunks WHERE embedding IS NOT NULL")?,
            fts_available: self.fts_available,
        })
    }

    /// Embedding-cache lookup by text hash.
    pub fn cache_get(
        &self,
        text_hash: &str,
        provider: &str,
        model: &str,
    ) -> DevclawResult<Option<Vec<f32>>> {
        let conn = self.conn()?;
        embedding_cache::get(&conn, text_hash, provider, model)
    }

    /// Embedding-cache upsert.
    pub fn cache_put(
        &self,
        text_hash: &str,
        provider: &str,
        model: &str,
        vector: &[f32],
    ) -> DevclawResult<()> {
        let conn = self.conn()?;
        embedding_cache::put(&conn, text_hash, provider, model, vector)
    }

    /// Retain the most recently updated cache entries.
    pub fn cache_prune(&self, keep: usize) -> DevclawResult<usize> {
        let conn = self.conn()?;
        embedding_cache::prune(&conn, keep)
    }
}

/// Escape LIKE wildcards in a user word.
fn escape_like(word: &str) -> String {
    word.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
