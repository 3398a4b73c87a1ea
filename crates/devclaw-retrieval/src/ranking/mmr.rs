//! Maximal Marginal Relevance re-ranking.
//!
//! Greedy selection balancing relevance against similarity to what is
//! already selected: `λ·relevance − (1−λ)·max_similarity`. Similarity is
//! Jaccard over lowercased tokens of length > 2, with token sets memoised
//! across candidates.

use devclaw_core::models::SearchResult;

use super::similarity::{jaccard_similarity, token_set};

const DEFAULT_LAMBDA: f64 = 0.7;

/// Re-rank `results` down to `max` diverse entries.
///
/// The highest-relevance input always comes first. Inputs already within
/// the budget are returned unchanged, which makes the pass idempotent.
pub fn rerank(results: &[SearchResult], lambda: f64, max: usize) -> Vec<SearchResult> {
    if results.len() <= max {
        return results.to_vec();
    }
    let lambda = if lambda <= 0.0 {
        DEFAULT_LAMBDA
    } else {
        lambda.clamp(0.0, 1.0)
    };

    let token_sets: Vec<_> = results.iter().map(|r| token_set(&r.text)).collect();

    // Seed with the highest-relevance candidate.
    let mut remaining: Vec<usize> = (0..results.len()).collect();
    let seed = remaining
        .iter()
        .copied()
        .max_by(|&a, &b| {
            results[a]
                .score
                .partial_cmp(&results[b].score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(0);
    remaining.retain(|&i| i != seed);
    let mut selected = vec![seed];

    while selected.len() < max && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_gain = f64::NEG_INFINITY;
        for (pos, &candidate) in remaining.iter().enumerate() {
            let max_similarity = selected
                .iter()
                .map(|&s| jaccard_similarity(&token_sets[candidate], &token_sets[s]))
                .fold(0.0f64, f64::max);
            let gain = lambda * results[candidate].score - (1.0 - lambda) * max_similarity;
            if gain > best_gain {
                best_gain = gain;
                best_pos = pos;
            }
        }
        selected.push(remaining.remove(best_pos));
    }

    selected.into_iter().map(|i| results[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(file_id: &str, score: f64, text: &str) -> SearchResult {
        SearchResult::new(file_id, text, score)
    }

    #[test]
    fn diversifies_near_duplicates() {
        let results = vec![
            result("a", 1.0, "apple banana cherry"),
            result("b", 0.95, "apple banana date"),
            result("c", 0.8, "elephant fox giraffe"),
        ];
        let reranked = rerank(&results, 0.7, 2);
        let ids: Vec<&str> = reranked.iter().map(|r| r.file_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn first_output_is_highest_relevance_input() {
        let results = vec![
            result("low", 0.2, "one two three"),
            result("high", 0.9, "four five six"),
            result("mid", 0.5, "seven eight nine"),
        ];
        let reranked = rerank(&results, 0.7, 2);
        assert_eq!(reranked[0].file_id, "high");
    }

    #[test]
    fn output_length_is_min_of_max_and_input() {
        let results = vec![
            result("a", 1.0, "aaa"),
            result("b", 0.9, "bbb"),
            result("c", 0.8, "ccc"),
            result("d", 0.7, "ddd"),
        ];
        assert_eq!(rerank(&results, 0.7, 2).len(), 2);
        assert_eq!(rerank(&results, 0.7, 10).len(), 4);
    }

    #[test]
    fn rerank_of_own_output_is_noop() {
        let results = vec![
            result("a", 1.0, "apple banana cherry"),
            result("b", 0.95, "apple banana date"),
            result("c", 0.8, "elephant fox giraffe"),
            result("d", 0.6, "hippo iguana jackal"),
        ];
        let once = rerank(&results, 0.7, 3);
        let twice = rerank(&once, 0.7, 3);
        let ids = |v: &[SearchResult]| -> Vec<String> {
            v.iter().map(|r| r.file_id.clone()).collect()
        };
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn non_positive_lambda_falls_back_to_default() {
        let results = vec![
            result("a", 1.0, "apple banana cherry"),
            result("b", 0.95, "apple banana date"),
            result("c", 0.8, "elephant fox giraffe"),
        ];
        assert_eq!(rerank(&results, 0.0, 2), rerank(&results, 0.7, 2));
    }
}
