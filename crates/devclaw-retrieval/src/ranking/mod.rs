//! Scoring and re-ranking: similarity kernels, RRF fusion, temporal
//! decay, MMR diversification.

pub mod decay;
pub mod mmr;
pub mod rrf;
pub mod similarity;

pub use similarity::{cosine_similarity, jaccard_similarity, token_set};
