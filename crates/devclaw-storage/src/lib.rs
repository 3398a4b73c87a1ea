//! # devclaw-storage
//!
//! SQLite persistence for the memory subsystem: files + chunks schema,
//! FTS5 virtual table (with LIKE fallback when the build lacks FTS5),
//! delta-indexed content, the in-memory vector cache, and the
//! content-addressed embedding cache.

pub mod embedding_cache;
mod pragmas;
mod schema;
pub mod store;

pub use store::{ChunkStore, FileInfo, StoreStats, VectorCacheEntry};

use devclaw_core::errors::{DevclawError, StorageError};

/// Wrap a rusqlite failure with the operation that triggered it.
pub(crate) fn db_err(operation: &'static str, e: rusqlite::Error) -> DevclawError {
    StorageError::db(operation, e).into()
}
