//! Input bounds for questions and answers.
//!
//! The store columns are `VARCHAR(100)` for titles and `VARCHAR(200)` for
//! content. Inputs are trimmed and then rejected when they fall outside those
//! bounds; nothing is silently truncated.

use uuid::Uuid;

use super::entities::QuestionId;
use super::error::DomainError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const CONTENT_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    pub created_by: Uuid,
}

impl NewQuestion {
    pub fn new(title: &str, content: &str, created_by: Uuid) -> Result<Self, DomainError> {
        Ok(Self {
            title: bounded("title", title, TITLE_MAX_CHARS)?,
            content: bounded("content", content, CONTENT_MAX_CHARS)?,
            created_by,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionUpdate {
    pub id: QuestionId,
    pub title: String,
    pub content: String,
}

impl QuestionUpdate {
    pub fn new(id: QuestionId, title: &str, content: &str) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            title: bounded("title", title, TITLE_MAX_CHARS)?,
            content: bounded("content", content, CONTENT_MAX_CHARS)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub question_id: QuestionId,
    pub content: String,
    pub created_by: Uuid,
}

impl NewAnswer {
    pub fn new(
        question_id: QuestionId,
        content: &str,
        created_by: Uuid,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            question_id,
            content: bounded("content", content, CONTENT_MAX_CHARS)?,
            created_by,
        })
    }
}

fn bounded(field: &'static str, value: &str, max_chars: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }

    let length = trimmed.chars().count();
    if length > max_chars {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max_chars} characters (got {length})"),
        ));
    }

    Ok(trimmed.to_string())
}
