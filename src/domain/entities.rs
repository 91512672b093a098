//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

pub type QuestionId = i64;
pub type AnswerId = i64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub title: String,
    pub content: String,
    pub created_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Owned answers. Empty when the query that produced the record did not load them.
    pub answers: Vec<AnswerRecord>,
}

impl QuestionRecord {
    pub fn has_answers(&self) -> bool {
        !self.answers.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRecord {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub content: String,
    pub created_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Half-open `[start, end)` interval over creation timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl TimeRange {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}
