//! Postgres-backed store implementation.

mod questions;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::QuestionFilter;

use util::contains_pattern;

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// Appends `AND ...` conditions for `filter`; the query must already have a `WHERE`.
    fn apply_question_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &QuestionFilter) {
        match filter.answered {
            Some(true) => {
                qb.push(" AND EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id)");
            }
            Some(false) => {
                qb.push(" AND NOT EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id)");
            }
            None => {}
        }

        if !filter.terms.is_empty() {
            qb.push(" AND (");
            for (index, term) in filter.terms.iter().enumerate() {
                if index > 0 {
                    qb.push(" OR ");
                }
                let pattern = contains_pattern(term);
                qb.push("q.title ILIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\' OR q.content ILIKE ");
                qb.push_bind(pattern);
                qb.push(" ESCAPE '\\'");
            }
            qb.push(")");
        }

        if let Some(range) = filter.created_between {
            qb.push(" AND q.created_at >= ");
            qb.push_bind(range.start);
            qb.push(" AND q.created_at < ");
            qb.push_bind(range.end);
        }
    }
}
