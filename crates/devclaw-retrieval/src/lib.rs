//! # devclaw-retrieval
//!
//! The hybrid retrieval engine: keyword (FTS5/BM25 with LIKE fallback) and
//! vector (cosine over the store's vector cache) searches dispatched
//! concurrently, fused with Reciprocal Rank Fusion, then optionally
//! re-shaped by exponential temporal decay and MMR diversification.

pub mod engine;
pub mod ranking;
pub mod stopwords;
pub mod tokenize;

pub use engine::RetrievalEngine;
