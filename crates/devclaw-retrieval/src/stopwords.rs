//! Multilingual stop-word table.
//!
//! English, Portuguese (with and without diacritics), Spanish, and French.
//! Immutable after init; lookups are case-insensitive because the
//! tokeniser lowercases before consulting the table.

use std::collections::HashSet;
use std::sync::LazyLock;

#[rustfmt::skip]
const STOP_WORD_LIST: &[&str] = &[
    // English
    "about", "after", "all", "also", "am", "an", "and", "any", "are", "as",
    "at", "be", "because", "been", "before", "being", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down",
    "during", "each", "few", "for", "from", "had", "has", "have", "having",
    "he", "her", "here", "hers", "him", "his", "how", "if", "in", "into",
    "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our",
    "out", "over", "own", "same", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your",
    // Portuguese
    "ao", "aos", "aquela", "aquele", "aquilo", "as", "com", "como", "da",
    "das", "de", "dela", "dele", "deles", "do", "dos", "ela", "elas",
    "ele", "eles", "em", "entre", "era", "essa", "esse", "esta", "este",
    "isso", "isto", "já", "ja", "mais", "mas", "mesmo", "meu", "minha",
    "muito", "na", "nas", "nem", "no", "nos", "nós", "nossa", "nosso",
    "não", "nao", "os", "ou", "para", "pela", "pelo", "por", "porque",
    "quais", "qual", "quando", "que", "quem", "se", "sem", "ser", "seu",
    "sua", "suas", "seus", "são", "sao", "também", "tambem", "tem", "têm",
    "ter", "um", "uma", "umas", "uns", "você", "voce", "vocês", "voces",
    // Spanish
    "al", "algo", "como", "con", "cual", "cuales", "cuando", "del",
    "donde", "el", "ella", "ellas", "ellos", "en", "era", "es", "esa",
    "ese", "eso", "esta", "estas", "este", "estos", "están", "estan",
    "fue", "la", "las", "le", "les", "lo", "los", "mas", "más", "mi",
    "mis", "muy", "nosotros", "nuestra", "nuestro", "para", "pero", "por",
    "porque", "que", "quien", "qué", "sin", "sobre", "son", "su", "sus",
    "también", "tambien", "una", "unas", "uno", "unos", "usted",
    "ustedes", "ya", "yo",
    // French
    "au", "aux", "avec", "ce", "ces", "cette", "cela", "ceux", "dans",
    "des", "déjà", "deja", "donc", "du", "elle", "elles", "est", "et",
    "était", "etait", "été", "ete", "il", "ils", "je", "la", "le", "les",
    "leur", "leurs", "ma", "mais", "mes", "moins", "mon", "ne", "nos",
    "notre", "nous", "où", "ou", "par", "pas", "plus", "pour", "quand",
    "qui", "quoi", "sa", "sans", "ses", "son", "sont", "sous", "sur",
    "toi", "ton", "très", "tres", "tu", "un", "une", "vos", "votre",
    "vous",
];

/// Process-wide stop-word set, built once.
pub static STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORD_LIST.iter().copied().collect());

/// Whether a lowercased token is a stop word.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_all_four_languages() {
        for word in ["the", "não", "también", "déjà"] {
            assert!(is_stop_word(word), "{word} should be a stop word");
        }
    }

    #[test]
    fn content_words_pass() {
        for word in ["cosine", "similarity", "elefante", "mémoire"] {
            assert!(!is_stop_word(word), "{word} should not be a stop word");
        }
    }

    #[test]
    fn table_has_expected_size() {
        // Duplicates across languages collapse in the set.
        assert!(STOP_WORDS.len() > 200);
    }
}
