//! Content-addressed embedding cache.
//!
//! Rows are keyed by `(text_hash, provider, model)` — vectors produced by
//! distinct provider/model pairs are never interchangeable. Vectors are
//! stored as little-endian f32 blobs.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use devclaw_core::errors::DevclawResult;

use crate::db_err;

/// Look up a cached vector.
pub fn get(
    conn: &Connection,
    text_hash: &str,
    provider: &str,
    model: &str,
) -> DevclawResult<Option<Vec<f32>>> {
    let blob: Option<Vec<u8>> = conn
        .query_row(
            "SELECT embedding FROM embedding_cache
             WHERE text_hash = ?1 AND provider = ?2 AND model = ?3",
            params![text_hash, provider, model],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| db_err("cache_get", e))?;
    Ok(blob.map(|b| blob_to_vector(&b)))
}

/// Upsert a vector with the current timestamp.
pub fn put(
    conn: &Connection,
    text_hash: &str,
    provider: &str,
    model: &str,
    vector: &[f32],
) -> DevclawResult<()> {
    conn.execute(
        "INSERT INTO embedding_cache (text_hash, provider, model, embedding, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(text_hash, provider, model)
         DO UPDATE SET embedding = excluded.embedding, updated_at = excluded.updated_at",
        params![
            text_hash,
            provider,
            model,
            vector_to_blob(vector),
            Utc::now().to_rfc3339()
        ],
    )
    .map_err(|e| db_err("cache_put", e))?;
    Ok(())
}

/// Retain the `keep` most recently updated entries, removing the rest in a
/// single statement. Returns the number of rows deleted.
pub fn prune(conn: &Connection, keep: usize) -> DevclawResult<usize> {
    let deleted = conn
        .execute(
            "DELETE FROM embedding_cache
             WHERE (text_hash, provider, model) NOT IN (
                 SELECT text_hash, provider, model FROM embedding_cache
                 ORDER BY updated_at DESC
                 LIMIT ?1
             )",
            params![keep as i64],
        )
        .map_err(|e| db_err("cache_prune", e))?;
    Ok(deleted)
}

pub(crate) fn vector_to_blob(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub(crate) fn blob_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
