//! Tokenization shared by the category and relevance heuristics.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Tokens shorter than this never become keywords.
pub const MIN_KEYWORD_CHARS: usize = 4;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "how", "what", "why", "when", "where", "to", "in", "on", "at",
    "for", "with", "by", "about", "like", "through", "and", "or", "but", "if", "because", "as",
    "until", "while", "of", "from", "up", "down", "out", "off", "over", "under", "again",
    "further", "then", "once", "here", "there", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "can", "will", "just", "should", "now", "i", "me", "my", "we", "our", "you",
    "your", "he", "him", "his", "she", "her", "it", "its", "they", "them", "their",
];

static STOP_WORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOP_WORDS.iter().copied().collect());

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORD_SET.contains(token)
}

/// Lower-cased whitespace tokens, in input order.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(str::to_lowercase)
}

pub fn is_keyword(token: &str) -> bool {
    token.chars().count() >= MIN_KEYWORD_CHARS && !is_stop_word(token)
}

/// Keyword tokens of `text`, considering at most `limit` raw tokens.
pub fn keywords(text: &str, limit: Option<usize>) -> Vec<String> {
    tokens(text)
        .take(limit.unwrap_or(usize::MAX))
        .filter(|token| is_keyword(token))
        .collect()
}

/// Upper-case the first character, leaving the rest untouched.
pub fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-cased, whitespace separated query terms.
pub fn query_terms(query: &str) -> Vec<String> {
    tokens(query).collect()
}
