//! RetrievalEngine: orchestrates the hybrid pipeline.
//!
//! query → (vector ∥ keyword) → RRF fusion → temporal decay → MMR → top-k.
//! The two legs run concurrently; either failing independently leaves the
//! other to carry the query. The engine holds shared references to the
//! store and the provider — the store keeps exclusive ownership of the
//! database handle.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use devclaw_core::config::MemoryConfig;
use devclaw_core::errors::{DevclawError, DevclawResult};
use devclaw_core::models::SearchResult;
use devclaw_core::traits::EmbeddingProvider;
use devclaw_core::Ctx;
use devclaw_storage::ChunkStore;

use crate::ranking::{cosine_similarity, decay, mmr, rrf};
use crate::tokenize::{expand_for_fts, extract_keywords, sanitise_fts_phrase};

pub struct RetrievalEngine {
    store: Arc<ChunkStore>,
    provider: Arc<dyn EmbeddingProvider>,
    config: MemoryConfig,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<ChunkStore>,
        provider: Arc<dyn EmbeddingProvider>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// BM25/keyword leg. FTS5 phrase query first; when it comes back thin,
    /// an OR-expanded keyword query widens the net. LIKE fallback when the
    /// store has no FTS index. Checks the context between database steps,
    /// so a cancelled hybrid search stops this leg too.
    pub fn search_keyword(
        &self,
        ctx: &Ctx,
        query: &str,
        max: usize,
    ) -> DevclawResult<Vec<SearchResult>> {
        keyword_search(&self.store, ctx, query, max)
    }

    /// Vector leg: embed the query, scan the vector cache under a shared
    /// lock, keep positive cosine similarities.
    ///
    /// Embedding failures degrade to an empty result — BM25 carries the
    /// hybrid query. Only database-level failures surface as errors.
    pub async fn search_vector(&self, query: &str, max: usize) -> DevclawResult<Vec<SearchResult>> {
        if !self.provider.is_enabled() {
            return Ok(Vec::new());
        }

        let query_vector = match self.provider.embed(&[query.to_string()]).await {
            Ok(mut vectors) if !vectors.is_empty() => vectors.swap_remove(0),
            Ok(_) => return Ok(Vec::new()),
            Err(e) => {
                warn!(error = %e, "query embedding failed, vector leg returns empty");
                return Ok(Vec::new());
            }
        };
        if query_vector.is_empty() {
            return Ok(Vec::new());
        }

        let snapshot = self.store.vector_snapshot()?;
        let mut results: Vec<SearchResult> = snapshot
            .iter()
            .filter(|entry| !entry.embedding.is_empty())
            .filter_map(|entry| {
                let similarity = cosine_similarity(&query_vector, &entry.embedding);
                (similarity > 0.0)
                    .then(|| SearchResult::new(entry.file_id.clone(), entry.text.clone(), similarity))
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(max * 2);
        Ok(results)
    }

    /// Hybrid search: both legs concurrently at 4·max candidates each,
    /// fused with weighted RRF, filtered by `min_score`, truncated to `max`.
    pub async fn hybrid(
        &self,
        ctx: &Ctx,
        query: &str,
        max: usize,
        min_score: f64,
        vector_weight: f64,
        keyword_weight: f64,
    ) -> DevclawResult<Vec<SearchResult>> {
        let fetch = max.max(1) * 4;

        // spawn_blocking work cannot be preempted by dropping its handle;
        // the context travels into the closure so the keyword leg can bail
        // out cooperatively when the hybrid search is cancelled.
        let keyword_handle = {
            let store = Arc::clone(&self.store);
            let query = query.to_string();
            let ctx = ctx.clone();
            tokio::task::spawn_blocking(move || keyword_search(&store, &ctx, &query, fetch))
        };

        let (vector_leg, keyword_leg) = tokio::select! {
            _ = ctx.cancelled() => return Err(DevclawError::Cancelled),
            legs = async {
                tokio::join!(self.search_vector(query, fetch), keyword_handle)
            } => legs,
        };

        let vector_hits = match vector_leg {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "vector search failed, fusing keyword results only");
                Vec::new()
            }
        };
        let keyword_hits = match keyword_leg {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(error = %e, "keyword search failed, fusing vector results only");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "keyword search task aborted, fusing vector results only");
                Vec::new()
            }
        };

        debug!(
            vector = vector_hits.len(),
            keyword = keyword_hits.len(),
            "fusing hybrid legs"
        );

        let mut fused = rrf::fuse(&vector_hits, &keyword_hits, vector_weight, keyword_weight);
        fused.retain(|r| r.score >= min_score);
        fused.truncate(max);
        Ok(fused)
    }

    /// Full pipeline with the configured options: hybrid at 2·max, then
    /// temporal decay, re-sort, MMR, final truncation.
    pub async fn search(&self, ctx: &Ctx, query: &str) -> DevclawResult<Vec<SearchResult>> {
        let c = &self.config;
        let mut results = self
            .hybrid(
                ctx,
                query,
                c.max_results * 2,
                c.min_score,
                c.vector_weight,
                c.keyword_weight,
            )
            .await?;

        if c.temporal_decay {
            decay::apply(&mut results, c.half_life_days, Utc::now());
            results.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        if c.mmr {
            results = mmr::rerank(&results, c.mmr_lambda, c.max_results);
        }

        results.truncate(c.max_results);
        Ok(results)
    }
}

/// Keyword search against the store. Free function so the hybrid path can
/// run it on the blocking pool without borrowing the engine. Cancellation
/// is cooperative: the context is checked before each database step.
fn keyword_search(
    store: &ChunkStore,
    ctx: &Ctx,
    query: &str,
    max: usize,
) -> DevclawResult<Vec<SearchResult>> {
    if ctx.is_cancelled() {
        return Err(DevclawError::Cancelled);
    }
    if !store.fts_available() {
        return like_fallback(store, ctx, query, max);
    }

    let phrase = sanitise_fts_phrase(query);
    let mut rows = if phrase.is_empty() {
        Vec::new()
    } else {
        store.fts_search(&phrase, max)?
    };

    // Thin phrase results: widen with the OR-expanded keyword query and
    // merge, first-seen order, capped at 2·max.
    if rows.len() < max / 2 {
        if ctx.is_cancelled() {
            return Err(DevclawError::Cancelled);
        }
        let expanded = expand_for_fts(&extract_keywords(query));
        if !expanded.is_empty() {
            let widened = store.fts_search(&expanded, max)?;
            let mut seen: std::collections::HashSet<String> = rows
                .iter()
                .map(|(file_id, text, _)| format!("{file_id}{text}"))
                .collect();
            for row in widened {
                if rows.len() >= max * 2 {
                    break;
                }
                if seen.insert(format!("{}{}", row.0, row.1)) {
                    rows.push(row);
                }
            }
        }
    }

    Ok(rows
        .into_iter()
        .map(|(file_id, text, rank)| {
            // BM25 rank: smaller = better. Map to a positive score.
            SearchResult::new(file_id, text, 1.0 / (1.0 + rank.abs()))
        })
        .collect())
}

/// LIKE-based scan used when the SQLite build lacks FTS5. Score is the
/// fraction of query words present in the chunk.
fn like_fallback(
    store: &ChunkStore,
    ctx: &Ctx,
    query: &str,
    max: usize,
) -> DevclawResult<Vec<SearchResult>> {
    let words: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    if ctx.is_cancelled() {
        return Err(DevclawError::Cancelled);
    }
    let rows = store.like_search(&words)?;
    let mut results: Vec<SearchResult> = rows
        .into_iter()
        .map(|(file_id, text)| {
            let lowered = text.to_lowercase();
            let matches = words.iter().filter(|w| lowered.contains(w.as_str())).count();
            let score = matches as f64 / words.len() as f64;
            SearchResult::new(file_id, text, score)
        })
        .filter(|r| r.score > 0.0)
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(max);
    Ok(results)
}
