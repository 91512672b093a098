//! Cache key definitions.
//!
//! A key is the read operation plus its normalized parameters. Categories are
//! trimmed and lower-cased; search terms are lower-cased, sorted and
//! deduplicated so any permutation of the same term set shares one entry.
//! Date ranges key on the exact nanosecond bounds sent to the store.

use std::fmt;

use time::OffsetDateTime;

use crate::domain::entities::{QuestionId, TimeRange};

use super::policy::ExpiryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    AllQuestions,
    QuestionsWithAnswers,
    UnansweredQuestions,
    TotalCount,
    AnsweredCount,
    QuestionById(QuestionId),
    QuestionsByCategory(String),
    CountByCategory(String),
    QuestionsBySearch(Vec<String>),
    QuestionsInRange { start: i128, end: i128 },
    AnswersInRange { start: i128, end: i128 },
}

impl CacheKey {
    pub fn by_category(category: &str) -> Self {
        Self::QuestionsByCategory(normalize_category(category))
    }

    pub fn count_by_category(category: &str) -> Self {
        Self::CountByCategory(normalize_category(category))
    }

    pub fn by_search<S: AsRef<str>>(terms: &[S]) -> Self {
        Self::QuestionsBySearch(normalize_terms(terms))
    }

    pub fn questions_in_range(range: &TimeRange) -> Self {
        Self::QuestionsInRange {
            start: unix_nanos(range.start),
            end: unix_nanos(range.end),
        }
    }

    pub fn answers_in_range(range: &TimeRange) -> Self {
        Self::AnswersInRange {
            start: unix_nanos(range.start),
            end: unix_nanos(range.end),
        }
    }

    /// Stable operation name, used as a metrics label.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::AllQuestions => "all_questions",
            Self::QuestionsWithAnswers => "questions_with_answers",
            Self::UnansweredQuestions => "unanswered_questions",
            Self::TotalCount => "total_questions_count",
            Self::AnsweredCount => "answered_questions_count",
            Self::QuestionById(_) => "question_by_id",
            Self::QuestionsByCategory(_) => "questions_by_category",
            Self::CountByCategory(_) => "questions_count_by_category",
            Self::QuestionsBySearch(_) => "questions_by_search",
            Self::QuestionsInRange { .. } => "questions_count_by_date_range",
            Self::AnswersInRange { .. } => "answers_count_by_date_range",
        }
    }

    pub fn policy(&self) -> ExpiryPolicy {
        match self {
            Self::AllQuestions
            | Self::QuestionsWithAnswers
            | Self::UnansweredQuestions
            | Self::TotalCount
            | Self::AnsweredCount => ExpiryPolicy::BULK,
            Self::QuestionsByCategory(_)
            | Self::CountByCategory(_)
            | Self::QuestionsBySearch(_) => ExpiryPolicy::VOLATILE,
            Self::QuestionById(_) => ExpiryPolicy::ENTITY,
            Self::QuestionsInRange { .. } | Self::AnswersInRange { .. } => {
                ExpiryPolicy::DATE_RANGE
            }
        }
    }

    /// Keys a successful write to `question` must drop.
    pub fn affected_by_write(question: Option<QuestionId>) -> Vec<Self> {
        let mut keys = vec![
            Self::AllQuestions,
            Self::QuestionsWithAnswers,
            Self::UnansweredQuestions,
            Self::TotalCount,
            Self::AnsweredCount,
        ];
        keys.extend(question.map(Self::QuestionById));
        keys
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuestionById(id) => write!(f, "question_{id}"),
            Self::QuestionsByCategory(category) => write!(f, "questions_category_{category}"),
            Self::CountByCategory(category) => write!(f, "count_category_{category}"),
            Self::QuestionsBySearch(terms) => write!(f, "questions_search_{}", terms.join("_")),
            Self::QuestionsInRange { start, end } => write!(f, "questions_range_{start}_{end}"),
            Self::AnswersInRange { start, end } => write!(f, "answers_range_{start}_{end}"),
            other => f.write_str(other.operation()),
        }
    }
}

fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

fn normalize_terms<S: AsRef<str>>(terms: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = terms
        .iter()
        .map(|term| term.as_ref().trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

fn unix_nanos(at: OffsetDateTime) -> i128 {
    at.unix_timestamp_nanos()
}
