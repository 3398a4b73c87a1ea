//! Property suites for the tokeniser, similarity kernels, decay, MMR,
//! and RRF fusion.

use proptest::prelude::*;

use devclaw_core::models::SearchResult;
use devclaw_retrieval::ranking::{
    cosine_similarity, decay, jaccard_similarity, mmr, rrf, token_set,
};
use devclaw_retrieval::stopwords::is_stop_word;
use devclaw_retrieval::tokenize::{expand_for_fts, extract_keywords};

// ── Tokeniser ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn keywords_are_lowercase_long_and_content_bearing(query in ".{0,200}") {
        for keyword in extract_keywords(&query) {
            prop_assert!(keyword.chars().count() >= 2, "too short: {keyword:?}");
            prop_assert_eq!(&keyword.to_lowercase(), &keyword);
            prop_assert!(!is_stop_word(&keyword));
            prop_assert!(!keyword.chars().all(|c| c.is_numeric()));
            prop_assert!(keyword.chars().any(|c| c.is_alphanumeric()));
        }
    }

    #[test]
    fn expansion_has_two_parts_per_long_keyword(
        words in proptest::collection::vec("[a-z]{3,10}", 1..8)
    ) {
        let keywords: Vec<String> = words;
        let expanded = expand_for_fts(&keywords);
        let unique: std::collections::HashSet<&String> = keywords.iter().collect();
        let parts = expanded.split(" OR ").count();
        prop_assert_eq!(parts, unique.len() * 2);
    }
}

// ── Similarity kernels ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn cosine_self_similarity_is_one(v in proptest::collection::vec(-100.0f32..100.0, 1..64)) {
        prop_assume!(v.iter().any(|x| *x != 0.0));
        let sim = cosine_similarity(&v, &v);
        prop_assert!((sim - 1.0).abs() < 1e-6, "cos(a,a) = {sim}");
    }

    #[test]
    fn cosine_symmetric_and_bounded(
        a in proptest::collection::vec(-100.0f32..100.0, 8),
        b in proptest::collection::vec(-100.0f32..100.0, 8),
    ) {
        let ab = cosine_similarity(&a, &b);
        let ba = cosine_similarity(&b, &a);
        prop_assert_eq!(ab, ba);
        prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&ab));
    }

    #[test]
    fn jaccard_self_is_one_nonempty_vs_empty_is_zero(text in "[a-z]{3,8}( [a-z]{3,8}){0,6}") {
        let set = token_set(&text);
        prop_assume!(!set.is_empty());
        prop_assert_eq!(jaccard_similarity(&set, &set), 1.0);
        prop_assert_eq!(jaccard_similarity(&set, &Default::default()), 0.0);
    }
}

// ── Temporal decay ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn decay_factor_in_unit_interval(age_days in 0i64..2000, half_life in 1.0f64..365.0) {
        let now = chrono::Utc::now();
        let date = now.date_naive() - chrono::Duration::days(age_days);
        let file_id = format!("log/{}.md", date.format("%Y-%m-%d"));
        let factor = decay::decay_factor(&file_id, half_life, now);
        prop_assert!((0.0..=1.0).contains(&factor));
    }

    #[test]
    fn decay_is_monotone_in_age(half_life in 1.0f64..365.0) {
        let now = chrono::Utc::now();
        let mut prev = f64::INFINITY;
        for age in [0i64, 10, 30, 90, 365] {
            let date = now.date_naive() - chrono::Duration::days(age);
            let file_id = format!("{}.md", date.format("%Y-%m-%d"));
            let factor = decay::decay_factor(&file_id, half_life, now);
            prop_assert!(factor <= prev + f64::EPSILON);
            prev = factor;
        }
    }
}

#[test]
fn memory_files_never_decay() {
    let mut results = vec![SearchResult::new("old/2019-01-01/MEMORY.md", "text", 0.9)];
    decay::apply(&mut results, 30.0, chrono::Utc::now());
    assert_eq!(results[0].score, 0.9);
}

// ── MMR ──────────────────────────────────────────────────────────────────

fn arb_results() -> impl Strategy<Value = Vec<SearchResult>> {
    proptest::collection::vec(
        (0.0f64..1.0, "[a-z]{3,8}( [a-z]{3,8}){0,4}"),
        1..12,
    )
    .prop_map(|entries| {
        // The pipeline hands MMR a descending-sorted list.
        let mut results: Vec<SearchResult> = entries
            .into_iter()
            .enumerate()
            .map(|(i, (score, text))| SearchResult::new(format!("f{i}"), text, score))
            .collect();
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    })
}

proptest! {
    #[test]
    fn mmr_length_and_head(results in arb_results(), max in 1usize..8) {
        let reranked = mmr::rerank(&results, 0.7, max);
        prop_assert_eq!(reranked.len(), results.len().min(max));

        let best = results
            .iter()
            .map(|r| r.score)
            .fold(f64::NEG_INFINITY, f64::max);
        prop_assert!((reranked[0].score - best).abs() < 1e-12);
    }

    #[test]
    fn mmr_is_idempotent_on_its_output(results in arb_results(), max in 1usize..8) {
        let once = mmr::rerank(&results, 0.7, max);
        let twice = mmr::rerank(&once, 0.7, max);
        prop_assert_eq!(once, twice);
    }
}

// ── RRF ──────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn single_sided_fusion_preserves_order(
        texts in proptest::collection::hash_set("[a-z]{4,12}", 1..10),
        weight in 0.1f64..1.0,
    ) {
        let side: Vec<SearchResult> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| SearchResult::new(format!("f{i}"), t.clone(), 1.0))
            .collect();
        let fused = rrf::fuse(&side, &[], weight, 1.0 - weight);
        prop_assert_eq!(fused.len(), side.len());
        for (i, (fused_r, orig)) in fused.iter().zip(&side).enumerate() {
            prop_assert_eq!(&fused_r.file_id, &orig.file_id);
            let expected = weight / (i as f64 + 1.0);
            prop_assert!((fused_r.score - expected).abs() < 1e-12);
        }
    }
}
