use serde::{Deserialize, Serialize};

use super::defaults;

/// Hybrid retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Path to the SQLite store. `None` means in-memory (tests).
    pub db_path: Option<std::path::PathBuf>,
    /// Final result count returned by hybrid search.
    pub max_results: usize,
    /// Fused scores below this are discarded.
    pub min_score: f64,
    /// RRF weight of the vector leg.
    pub vector_weight: f64,
    /// RRF weight of the BM25/keyword leg.
    pub keyword_weight: f64,
    /// Whether dated files lose score exponentially with age.
    pub temporal_decay: bool,
    /// Half-life in days for temporal decay.
    pub half_life_days: f64,
    /// Whether MMR diversification re-ranks the final results.
    pub mmr: bool,
    /// MMR relevance/diversity balance. Clamped to [0, 1]; <= 0 means default.
    pub mmr_lambda: f64,
    /// Embedding-cache entries retained by `prune`.
    pub cache_keep_entries: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            max_results: defaults::DEFAULT_MAX_RESULTS,
            min_score: defaults::DEFAULT_MIN_SCORE,
            vector_weight: defaults::DEFAULT_VECTOR_WEIGHT,
            keyword_weight: defaults::DEFAULT_KEYWORD_WEIGHT,
            temporal_decay: true,
            half_life_days: defaults::DEFAULT_HALF_LIFE_DAYS,
            mmr: true,
            mmr_lambda: defaults::DEFAULT_MMR_LAMBDA,
            cache_keep_entries: defaults::DEFAULT_CACHE_KEEP_ENTRIES,
        }
    }
}
