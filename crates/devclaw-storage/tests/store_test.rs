//! Chunk store integration tests: delta indexing, embedding reuse,
//! cache behaviour, vector cache rebuilds.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use devclaw_core::errors::{DevclawResult, EmbeddingError};
use devclaw_core::hash::content_hash;
use devclaw_core::traits::EmbeddingProvider;
use devclaw_storage::ChunkStore;

/// Deterministic provider that counts embed calls.
struct CountingProvider {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    async fn embed(&self, texts: &[String]) -> DevclawResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::provider("counting", "forced failure").into());
        }
        // One distinctive vector per text, derived from its length.
        Ok(texts
            .iter()
            .map(|t| vec![t.len() as f32, 1.0, 0.5])
            .collect())
    }

    fn dimensions(&self) -> Option<usize> {
        Some(3)
    }

    fn name(&self) -> &str {
        "counting"
    }

    fn model(&self) -> &str {
        "test-model"
    }
}

fn chunks(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

#[tokio::test]
async fn index_and_fts_search() {
    let store = ChunkStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();

    store
        .index_chunks(
            "notes/a.md",
            &chunks(&["cosine similarity is a metric", "elderberry fig grape"]),
            "hash-1",
            &provider,
        )
        .await
        .unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.files, 1);
    assert_eq!(stats.chunks, 2);
    assert_eq!(stats.embedded_chunks, 2);
    assert!(stats.fts_available);

    let hits = store.fts_search("\"cosine similarity\"", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].1.contains("cosine similarity"));
}

#[tokio::test]
async fn reindex_with_same_hash_is_noop() {
    let store = ChunkStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();
    let texts = chunks(&["alpha beta", "gamma delta"]);

    store
        .index_chunks("f", &texts, "same-hash", &provider)
        .await
        .unwrap();
    assert_eq!(provider.call_count(), 1);

    let before = store.list_files().unwrap();

    // Same hash again: zero provider calls, indexed_at untouched.
    let second = CountingProvider::new();
    store
        .index_chunks("f", &texts, "same-hash", &second)
        .await
        .unwrap();
    assert_eq!(second.call_count(), 0);

    let after = store.list_files().unwrap();
    assert_eq!(before[0].indexed_at, after[0].indexed_at);
}

#[tokio::test]
async fn changed_file_reuses_known_chunk_embeddings() {
    let store = ChunkStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();

    store
        .index_chunks("f", &chunks(&["kept chunk", "dropped chunk"]), "v1", &provider)
        .await
        .unwrap();
    assert_eq!(provider.call_count(), 1);

    // One chunk survives, one is new: exactly one more provider call,
    // batched over just the new text.
    store
        .index_chunks("f", &chunks(&["kept chunk", "brand new chunk"]), "v2", &provider)
        .await
        .unwrap();
    assert_eq!(provider.call_count(), 2);

    let stats = store.stats().unwrap();
    assert_eq!(stats.chunks, 2);
    assert_eq!(stats.embedded_chunks, 2);
}

#[tokio::test]
async fn embedding_failure_degrades_to_unembedded_chunks() {
    let store = ChunkStore::open_in_memory().unwrap();
    let provider = CountingProvider::failing();

    store
        .index_chunks("f", &chunks(&["some text"]), "v1", &provider)
        .await
        .unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.chunks, 1);
    assert_eq!(stats.embedded_chunks, 0);

    // Keyword search still sees the chunk.
    let hits = store.fts_search("\"some text\"", 10).unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn fresh_embeddings_land_in_cache() {
    let store = ChunkStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();
    let text = "cache me".to_string();

    store
        .index_chunks("f", &[text.clone()], "v1", &provider)
        .await
        .unwrap();

    let cached = store
        .cache_get(&content_hash(&text), "counting", "test-model")
        .unwrap();
    assert_eq!(cached, Some(vec![text.len() as f32, 1.0, 0.5]));

    // A different file with the same text hits the cache, not the provider.
    store
        .index_chunks("g", &[text.clone()], "other", &provider)
        .await
        .unwrap();
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn cache_prune_keeps_most_recent() {
    let store = ChunkStore::open_in_memory().unwrap();
    for i in 0..10 {
        store
            .cache_put(&format!("hash-{i}"), "p", "m", &[i as f32])
            .unwrap();
    }
    let deleted = store.cache_prune(4).unwrap();
    assert_eq!(deleted, 6);
    // Most recent entries survive.
    assert!(store.cache_get("hash-9", "p", "m").unwrap().is_some());
    assert!(store.cache_get("hash-0", "p", "m").unwrap().is_none());
}

#[tokio::test]
async fn vector_cache_tracks_indexing() {
    let store = ChunkStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();

    assert!(store.vector_snapshot().unwrap().is_empty());

    store
        .index_chunks("f", &chunks(&["one", "two"]), "v1", &provider)
        .await
        .unwrap();
    let snapshot = store.vector_snapshot().unwrap();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().all(|e| e.file_id == "f"));
    assert!(snapshot.iter().all(|e| e.embedding.len() == 3));

    store.remove_file("f").unwrap();
    assert!(store.vector_snapshot().unwrap().is_empty());
    assert_eq!(store.stats().unwrap().files, 0);
}

#[tokio::test]
async fn remove_file_clears_fts_rows() {
    let store = ChunkStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();

    store
        .index_chunks("f", &chunks(&["searchable words here"]), "v1", &provider)
        .await
        .unwrap();
    store.remove_file("f").unwrap();

    let hits = store.fts_search("\"searchable words\"", 10).unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn like_search_matches_any_word() {
    let store = ChunkStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();

    store
        .index_chunks(
            "f",
            &chunks(&["apple banana", "cherry date", "elderberry"]),
            "v1",
            &provider,
        )
        .await
        .unwrap();

    let rows = store
        .like_search(&["banana".to_string(), "cherry".to_string()])
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn empty_chunks_are_skipped() {
    let store = ChunkStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();

    store
        .index_chunks("f", &chunks(&["real", "", "   "]), "v1", &provider)
        .await
        .unwrap();
    assert_eq!(store.stats().unwrap().chunks, 1);
}

#[tokio::test]
async fn store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("memory.db");
    let provider = CountingProvider::new();

    {
        let store = ChunkStore::open(&db).unwrap();
        store
            .index_chunks("f", &chunks(&["persistent text"]), "v1", &provider)
            .await
            .unwrap();
    }

    let store = ChunkStore::open(&db).unwrap();
    assert_eq!(store.stats().unwrap().chunks, 1);
    // Vector cache is rebuilt at open.
    assert_eq!(store.vector_snapshot().unwrap().len(), 1);
}
