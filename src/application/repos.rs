//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{AnswerRecord, QuestionId, QuestionRecord, TimeRange};
use crate::domain::questions::{NewAnswer, NewQuestion, QuestionUpdate};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Store-level question filter. All set conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    /// `Some(true)` keeps questions with at least one answer, `Some(false)` those with none.
    pub answered: Option<bool>,
    /// Title or content contains any of these, case-insensitively.
    pub terms: Vec<String>,
    /// Half-open creation window.
    pub created_between: Option<TimeRange>,
}

impl QuestionFilter {
    pub fn answered(answered: bool) -> Self {
        Self {
            answered: Some(answered),
            ..Self::default()
        }
    }

    pub fn matching<S: AsRef<str>>(terms: &[S]) -> Self {
        Self {
            terms: terms
                .iter()
                .map(|term| term.as_ref().trim().to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
            ..Self::default()
        }
    }

    pub fn created_between(range: TimeRange) -> Self {
        Self {
            created_between: Some(range),
            ..Self::default()
        }
    }
}

/// Relational store for questions and their answers.
///
/// Listings are ordered by question id ascending.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn list_questions(
        &self,
        filter: &QuestionFilter,
        include_answers: bool,
    ) -> Result<Vec<QuestionRecord>, RepoError>;

    async fn count_questions(&self, filter: &QuestionFilter) -> Result<i64, RepoError>;

    async fn count_answers(&self, range: &TimeRange) -> Result<i64, RepoError>;

    async fn find_question(&self, id: QuestionId) -> Result<Option<QuestionRecord>, RepoError>;

    async fn insert_question(&self, question: &NewQuestion) -> Result<QuestionRecord, RepoError>;

    /// Fails with [`RepoError::NotFound`] when the question does not exist.
    async fn insert_answer(&self, answer: &NewAnswer) -> Result<AnswerRecord, RepoError>;

    async fn update_question(&self, update: &QuestionUpdate) -> Result<QuestionRecord, RepoError>;

    /// Removes the question together with its answers.
    async fn delete_question(&self, id: QuestionId) -> Result<bool, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}
