//! Approximate topic taxonomy derived from question text.
//!
//! Categories are never persisted. They are the most frequent keywords over
//! titles (all tokens) and content (first [`CONTENT_TOKEN_LIMIT`] tokens),
//! pooled without weighting. Ties in frequency keep first-occurrence order.

use std::collections::HashMap;

use super::entities::QuestionRecord;
use super::text::{capitalize_first, keywords};

pub const CATEGORY_LIMIT: usize = 15;
pub const CONTENT_TOKEN_LIMIT: usize = 100;

/// Top [`CATEGORY_LIMIT`] categories across `questions`, capitalized.
pub fn extract_categories(questions: &[QuestionRecord]) -> Vec<String> {
    let words = questions.iter().flat_map(question_keywords);
    rank_by_frequency(words, CATEGORY_LIMIT)
        .into_iter()
        .map(|(word, _)| capitalize_first(&word))
        .collect()
}

/// Category of a single question: its most frequent keyword, if any survives filtering.
pub fn inferred_category(question: &QuestionRecord) -> Option<String> {
    rank_by_frequency(question_keywords(question), 1)
        .into_iter()
        .next()
        .map(|(word, _)| capitalize_first(&word))
}

fn question_keywords(question: &QuestionRecord) -> Vec<String> {
    let mut words = keywords(&question.title, None);
    words.extend(keywords(&question.content, Some(CONTENT_TOKEN_LIMIT)));
    words
}

/// Count occurrences and return the `limit` most frequent words.
///
/// Sorting is by descending count, then ascending index of first occurrence.
pub fn rank_by_frequency(
    words: impl IntoIterator<Item = String>,
    limit: usize,
) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, word) in words.into_iter().enumerate() {
        counts
            .entry(word)
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, position));
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first_seen))| (word, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(word, count, _)| (word, count))
        .collect()
}
