//! Weighted Reciprocal Rank Fusion.
//!
//! Each candidate at 0-based rank `i` in a list contributes `w · 1/(i+1)`
//! to its composite score. The fusion key is `sha256(file_id | text)` so
//! chunks of the same file sharing a prefix never collide.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use devclaw_core::models::SearchResult;

fn fusion_key(file_id: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_id.as_bytes());
    hasher.update(b"|");
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fuse the vector and keyword result lists.
///
/// When one list is empty the composite ordering equals the other list's
/// ordering scaled by its weight.
pub fn fuse(
    vector: &[SearchResult],
    keyword: &[SearchResult],
    vector_weight: f64,
    keyword_weight: f64,
) -> Vec<SearchResult> {
    let mut fused: HashMap<String, SearchResult> = HashMap::new();

    for (list, weight) in [(vector, vector_weight), (keyword, keyword_weight)] {
        for (rank, result) in list.iter().enumerate() {
            let contribution = weight / (rank as f64 + 1.0);
            fused
                .entry(fusion_key(&result.file_id, &result.text))
                .and_modify(|existing| existing.score += contribution)
                .or_insert_with(|| {
                    SearchResult::new(result.file_id.clone(), result.text.clone(), contribution)
                });
        }
    }

    let mut results: Vec<SearchResult> = fused.into_values().collect();
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(file_id: &str, text: &str) -> SearchResult {
        SearchResult::new(file_id, text, 1.0)
    }

    #[test]
    fn single_side_preserves_ordering_scaled_by_weight() {
        let keyword = vec![result("a", "first"), result("b", "second"), result("c", "third")];
        let fused = fuse(&[], &keyword, 0.7, 0.3);
        let ids: Vec<&str> = fused.iter().map(|r| r.file_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!((fused[0].score - 0.3).abs() < 1e-9);
        assert!((fused[1].score - 0.15).abs() < 1e-9);
    }

    #[test]
    fn shared_candidate_accumulates_both_sides() {
        let vector = vec![result("a", "common"), result("b", "vec only")];
        let keyword = vec![result("a", "common")];
        let fused = fuse(&vector, &keyword, 0.7, 0.3);
        assert_eq!(fused[0].file_id, "a");
        // 0.7/1 + 0.3/1
        assert!((fused[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn same_file_different_chunks_stay_distinct() {
        let vector = vec![result("a", "chunk one"), result("a", "chunk two")];
        let fused = fuse(&vector, &[], 0.7, 0.3);
        assert_eq!(fused.len(), 2);
    }
}
