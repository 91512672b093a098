use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{QuestionFilter, QuestionStore, RepoError};
use crate::domain::entities::{AnswerRecord, QuestionId, QuestionRecord, TimeRange};
use crate::domain::questions::{NewAnswer, NewQuestion, QuestionUpdate};

use super::{PostgresRepositories, map_sqlx_error};

const QUESTION_COLUMNS: &str = "q.id, q.title, q.content, q.created_by, q.created_at";
const ANSWER_COLUMNS: &str = "id, question_id, content, created_by, created_at";

#[derive(Debug, FromRow)]
struct QuestionRow {
    id: i64,
    title: String,
    content: String,
    created_by: Uuid,
    created_at: OffsetDateTime,
}

impl QuestionRow {
    fn into_record(self, answers: Vec<AnswerRecord>) -> QuestionRecord {
        QuestionRecord {
            id: self.id,
            title: self.title,
            content: self.content,
            created_by: self.created_by,
            created_at: self.created_at,
            answers,
        }
    }
}

#[derive(Debug, FromRow)]
struct AnswerRow {
    id: i64,
    question_id: i64,
    content: String,
    created_by: Uuid,
    created_at: OffsetDateTime,
}

impl From<AnswerRow> for AnswerRecord {
    fn from(row: AnswerRow) -> Self {
        Self {
            id: row.id,
            question_id: row.question_id,
            content: row.content,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

impl PostgresRepositories {
    async fn answers_for(
        &self,
        question_ids: &[QuestionId],
    ) -> Result<HashMap<QuestionId, Vec<AnswerRecord>>, RepoError> {
        if question_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, AnswerRow>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE question_id = ANY($1) ORDER BY id"
        ))
        .bind(question_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut grouped: HashMap<QuestionId, Vec<AnswerRecord>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.question_id)
                .or_default()
                .push(row.into());
        }
        Ok(grouped)
    }

    async fn attach_answers(
        &self,
        rows: Vec<QuestionRow>,
    ) -> Result<Vec<QuestionRecord>, RepoError> {
        let ids: Vec<QuestionId> = rows.iter().map(|row| row.id).collect();
        let mut answers = self.answers_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let owned = answers.remove(&row.id).unwrap_or_default();
                row.into_record(owned)
            })
            .collect())
    }
}

#[async_trait]
impl QuestionStore for PostgresRepositories {
    async fn list_questions(
        &self,
        filter: &QuestionFilter,
        include_answers: bool,
    ) -> Result<Vec<QuestionRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {QUESTION_COLUMNS} FROM questions q WHERE TRUE"
        ));
        Self::apply_question_filter(&mut qb, filter);
        qb.push(" ORDER BY q.id");

        let rows = qb
            .build_query_as::<QuestionRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if include_answers {
            self.attach_answers(rows).await
        } else {
            Ok(rows
                .into_iter()
                .map(|row| row.into_record(Vec::new()))
                .collect())
        }
    }

    async fn count_questions(&self, filter: &QuestionFilter) -> Result<i64, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM questions q WHERE TRUE");
        Self::apply_question_filter(&mut qb, filter);

        qb.build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn count_answers(&self, range: &TimeRange) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM answers WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<QuestionRecord>, RepoError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions q WHERE q.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(self.attach_answers(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn insert_question(&self, question: &NewQuestion) -> Result<QuestionRecord, RepoError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            "INSERT INTO questions AS q (title, content, created_by) VALUES ($1, $2, $3) \
             RETURNING q.id, q.title, q.content, q.created_by, q.created_at",
        )
        .bind(&question.title)
        .bind(&question.content)
        .bind(question.created_by)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into_record(Vec::new()))
    }

    async fn insert_answer(&self, answer: &NewAnswer) -> Result<AnswerRecord, RepoError> {
        let row = sqlx::query_as::<_, AnswerRow>(&format!(
            "INSERT INTO answers (question_id, content, created_by) \
             SELECT id, $2, $3 FROM questions WHERE id = $1 \
             RETURNING {ANSWER_COLUMNS}"
        ))
        .bind(answer.question_id)
        .bind(&answer.content)
        .bind(answer.created_by)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(AnswerRecord::from).ok_or(RepoError::NotFound)
    }

    async fn update_question(&self, update: &QuestionUpdate) -> Result<QuestionRecord, RepoError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            "UPDATE questions AS q SET title = $2, content = $3 WHERE q.id = $1 \
             RETURNING q.id, q.title, q.content, q.created_by, q.created_at",
        )
        .bind(update.id)
        .bind(&update.title)
        .bind(&update.content)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        self.attach_answers(vec![row])
            .await?
            .pop()
            .ok_or(RepoError::NotFound)
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}
