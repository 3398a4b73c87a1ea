//! Query tokenisation and FTS5 sanitisation.
//!
//! Two sanitisation policies exist on purpose: phrase literals replace
//! FTS operator characters with spaces and are wrapped in double quotes;
//! prefix forms strip the same characters and stay unwrapped so the
//! trailing `*` keeps its operator meaning. Output is always either empty
//! or a valid FTS5 expression.

use std::collections::HashSet;

use crate::stopwords::is_stop_word;

/// ASCII punctuation trimmed from token edges.
const TRIM_CHARS: &[char] = &[
    '.', ',', ';', ':', '!', '?', '"', '\'', '(', ')', '[', ']', '{', '}', '*', '`', '~', '@',
    '#', '$', '%', '&', '_', '-', '+', '=', '<', '>', '/', '\\', '|',
];

/// Characters significant to the FTS5 query mini-language.
const FTS_OPERATORS: &[char] = &['"', '(', ')', '*', '^', ':', '{', '}'];

/// Extract search keywords from a free-form query.
///
/// Lowercases, splits on whitespace, trims edge punctuation, and drops
/// short, all-digit, all-punctuation, and stop-word tokens.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let mut keywords = Vec::new();
    for raw in query.to_lowercase().split_whitespace() {
        let token = raw.trim_matches(|c| TRIM_CHARS.contains(&c));
        if token.chars().count() < 2 {
            continue;
        }
        if token.chars().all(|c| c.is_numeric()) {
            continue;
        }
        if token.chars().all(|c| !c.is_alphanumeric()) {
            continue;
        }
        if is_stop_word(token) {
            continue;
        }
        keywords.push(token.to_string());
    }
    keywords
}

/// Quote a phrase literal for FTS5: operator characters become spaces and
/// the result is wrapped in double quotes. Empty when nothing survives.
pub fn sanitise_fts_phrase(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if FTS_OPERATORS.contains(&c) { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return String::new();
    }
    format!("\"{cleaned}\"")
}

/// Strip FTS5 operator characters for a prefix form. No wrapping — the
/// caller appends `*`.
pub fn sanitise_fts_prefix(text: &str) -> String {
    text.chars().filter(|c| !FTS_OPERATORS.contains(c)).collect()
}

/// Expand keywords into an OR query: the quoted phrase form for every
/// keyword, plus a `keyword*` prefix form for keywords of length >= 3.
/// Parts are deduplicated by exact string.
pub fn expand_for_fts(keywords: &[String]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for keyword in keywords {
        let phrase = sanitise_fts_phrase(keyword);
        if !phrase.is_empty() && seen.insert(phrase.clone()) {
            parts.push(phrase);
        }
        if keyword.chars().count() >= 3 {
            let stripped = sanitise_fts_prefix(keyword);
            if !stripped.trim().is_empty() {
                let prefix = format!("{}*", stripped.trim());
                if seen.insert(prefix.clone()) {
                    parts.push(prefix);
                }
            }
        }
    }

    parts.join(" OR ")
}
