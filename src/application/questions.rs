use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::application::knowledge_base::{KnowledgeBaseRepository, ReadOutcome};
use crate::application::repos::RepoError;
use crate::domain::categories::inferred_category;
use crate::domain::entities::{AnswerRecord, QuestionId, QuestionRecord};
use crate::domain::error::DomainError;
use crate::domain::questions::{NewAnswer, NewQuestion, QuestionUpdate};

#[derive(Debug, Error)]
pub enum QuestionError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A question as shown to callers, annotated with its inferred category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    #[serde(flatten)]
    pub question: QuestionRecord,
    pub inferred_category: Option<String>,
}

impl From<QuestionRecord> for QuestionView {
    fn from(question: QuestionRecord) -> Self {
        let inferred_category = inferred_category(&question);
        Self {
            question,
            inferred_category,
        }
    }
}

#[derive(Clone)]
pub struct QuestionService {
    repository: Arc<KnowledgeBaseRepository>,
}

impl QuestionService {
    pub fn new(repository: Arc<KnowledgeBaseRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> ReadOutcome<Vec<QuestionView>> {
        self.repository
            .questions_with_answers()
            .await
            .map(|questions| questions.into_iter().map(QuestionView::from).collect())
    }

    pub async fn get(&self, id: QuestionId) -> ReadOutcome<Option<QuestionView>> {
        self.repository
            .question_by_id(id)
            .await
            .map(|question| question.map(QuestionView::from))
    }

    pub async fn create(
        &self,
        title: &str,
        content: &str,
        author: Uuid,
    ) -> Result<QuestionView, QuestionError> {
        let question = NewQuestion::new(title, content, author)?;
        let created = self.repository.add_question(&question).await?;
        Ok(created.into())
    }

    pub async fn add_answer(
        &self,
        question_id: QuestionId,
        content: &str,
        author: Uuid,
    ) -> Result<AnswerRecord, QuestionError> {
        let answer = NewAnswer::new(question_id, content, author)?;
        self.repository
            .add_answer(&answer)
            .await
            .map_err(|err| not_found_as(question_id, err))
    }

    pub async fn update(
        &self,
        id: QuestionId,
        title: &str,
        content: &str,
    ) -> Result<QuestionView, QuestionError> {
        let update = QuestionUpdate::new(id, title, content)?;
        self.repository
            .update_question(&update)
            .await
            .map(QuestionView::from)
            .map_err(|err| not_found_as(id, err))
    }

    /// Returns false when nothing was deleted.
    pub async fn delete(&self, id: QuestionId) -> Result<bool, QuestionError> {
        Ok(self.repository.delete_question(id).await?)
    }
}

fn not_found_as(id: QuestionId, err: RepoError) -> QuestionError {
    match err {
        RepoError::NotFound => DomainError::question_not_found(id).into(),
        other => QuestionError::Repo(other),
    }
}
