//! Content hashing helpers.
//!
//! One digest function used for file hashes, chunk hashes, and embedding
//! cache keys, so "same text" always means "same key" across the store.

/// Hex digest of arbitrary text.
pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}
