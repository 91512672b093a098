use thiserror::Error;

use crate::domain::entities::QuestionId;

/// Rejections raised by the question model itself, before any store call.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("question {id} does not exist")]
    QuestionNotFound { id: QuestionId },
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

impl DomainError {
    pub fn question_not_found(id: QuestionId) -> Self {
        Self::QuestionNotFound { id }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
