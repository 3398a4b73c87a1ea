//! Base tables, the FTS5 virtual index, and its sync triggers.

use rusqlite::Connection;
use tracing::warn;

use devclaw_core::errors::DevclawResult;

use crate::db_err;

/// Create the base tables. Idempotent.
pub fn create_tables(conn: &Connection) -> DevclawResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS files (
            file_id TEXT PRIMARY KEY,
            hash TEXT NOT NULL,
            indexed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id TEXT NOT NULL,
            chunk_idx INTEGER NOT NULL,
            text TEXT NOT NULL,
            hash TEXT NOT NULL,
            embedding BLOB,
            created_at TEXT NOT NULL,
            UNIQUE(file_id, chunk_idx)
        );
        CREATE INDEX IF NOT EXISTS idx_chunks_file ON chunks(file_id);

        CREATE TABLE IF NOT EXISTS embedding_cache (
            text_hash TEXT NOT NULL,
            provider TEXT NOT NULL,
            model TEXT NOT NULL,
            embedding BLOB NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (text_hash, provider, model)
        );
        ",
    )
    .map_err(|e| db_err("create_tables", e))?;
    Ok(())
}

/// Provision the FTS5 index over `chunks.text` plus the three sync
/// triggers. Returns false (degraded mode, LIKE fallback) when the SQLite
/// build lacks FTS5.
pub fn create_fts(conn: &Connection) -> bool {
    let result = conn.execute_batch(
        "
        CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
            text,
            content='chunks',
            content_rowid='id',
            tokenize='porter unicode61'
        );

        CREATE TRIGGER IF NOT EXISTS chunks_fts_insert AFTER INSERT ON chunks BEGIN
            INSERT INTO chunks_fts(rowid, text) VALUES (new.id, new.text);
        END;

        CREATE TRIGGER IF NOT EXISTS chunks_fts_delete AFTER DELETE ON chunks BEGIN
            INSERT INTO chunks_fts(chunks_fts, rowid, text) VALUES ('delete', old.id, old.text);
        END;

        CREATE TRIGGER IF NOT EXISTS chunks_fts_update AFTER UPDATE ON chunks BEGIN
            INSERT INTO chunks_fts(chunks_fts, rowid, text) VALUES ('delete', old.id, old.text);
            INSERT INTO chunks_fts(rowid, text) VALUES (new.id, new.text);
        END;
        ",
    );

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "FTS5 unavailable, keyword search falls back to LIKE");
            false
        }
    }
}
