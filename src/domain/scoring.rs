//! Relevance ranking for free-text lookups.
//!
//! `score = 3 × title hits + 2 × content hits + (1 if answered)`, where a hit
//! is a query term contained (case-insensitively) in the field.

use super::entities::QuestionRecord;

pub const TITLE_WEIGHT: usize = 3;
pub const CONTENT_WEIGHT: usize = 2;
pub const ANSWERED_BONUS: usize = 1;
pub const RELEVANT_LIMIT: usize = 10;

/// Score one question against lower-cased query terms.
pub fn relevance_score(question: &QuestionRecord, terms: &[String]) -> usize {
    let title = question.title.to_lowercase();
    let content = question.content.to_lowercase();

    let title_hits = terms.iter().filter(|term| title.contains(term.as_str())).count();
    let content_hits = terms
        .iter()
        .filter(|term| content.contains(term.as_str()))
        .count();
    let bonus = if question.has_answers() {
        ANSWERED_BONUS
    } else {
        0
    };

    TITLE_WEIGHT * title_hits + CONTENT_WEIGHT * content_hits + bonus
}

/// Order candidates by descending score and keep the top [`RELEVANT_LIMIT`].
///
/// The sort is stable: equal scores keep candidate order.
pub fn rank_relevant(candidates: Vec<QuestionRecord>, terms: &[String]) -> Vec<QuestionRecord> {
    let mut scored: Vec<(usize, QuestionRecord)> = candidates
        .into_iter()
        .map(|question| (relevance_score(&question, terms), question))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(RELEVANT_LIMIT)
        .map(|(_, question)| question)
        .collect()
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::domain::entities::AnswerRecord;

    fn question(id: i64, title: &str, content: &str, answers: usize) -> QuestionRecord {
        QuestionRecord {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created_by: Uuid::nil(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            answers: (0..answers)
                .map(|i| AnswerRecord {
                    id: i as i64 + 1,
                    question_id: id,
                    content: "answer".to_string(),
                    created_by: Uuid::nil(),
                    created_at: OffsetDateTime::UNIX_EPOCH,
                })
                .collect(),
        }
    }

    fn terms(query: &str) -> Vec<String> {
        crate::domain::text::query_terms(query)
    }

    #[test]
    fn scores_title_content_and_answer_bonus() {
        let q = question(
            1,
            "How to reset password?",
            "My password expired, I need a reset of the password",
            1,
        );
        assert_eq!(relevance_score(&q, &terms("password reset")), 11);
    }

    #[test]
    fn unmatched_unanswered_question_scores_zero() {
        let q = question(2, "Printer jam", "Paper stuck", 0);
        assert_eq!(relevance_score(&q, &terms("password reset")), 0);
    }

    #[test]
    fn zero_scores_survive_when_fewer_than_limit() {
        let candidates = vec![
            question(1, "Printer jam", "Paper stuck", 0),
            question(2, "Password reset", "", 0),
        ];
        let ranked = rank_relevant(candidates, &terms("password"));
        assert_eq!(
            ranked.iter().map(|q| q.id).collect::<Vec<_>>(),
            vec![2, 1]
        );
    }

    #[test]
    fn ranking_is_stable_and_capped() {
        let candidates: Vec<_> = (1..=12)
            .map(|id| question(id, "vpn", "", 0))
            .collect();
        let ranked = rank_relevant(candidates, &terms("vpn"));
        assert_eq!(ranked.len(), RELEVANT_LIMIT);
        assert_eq!(
            ranked.iter().map(|q| q.id).collect::<Vec<_>>(),
            (1..=10).collect::<Vec<_>>()
        );
    }
}
