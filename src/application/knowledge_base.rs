//! Cache-aside repository over the question store.
//!
//! Reads consult the [`QueryCache`] first and fall back to the store on a miss,
//! caching what the store returns. A failing or timed-out store read is logged
//! and answered with an empty value; the returned [`ReadOutcome`] records which
//! path produced the value. Writes go straight to the store and then drop the
//! bulk listing, count and per-question keys. Category and search entries are
//! left to expire on their own.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::application::repos::{QuestionFilter, QuestionStore, RepoError};
use crate::cache::{CacheKey, CachedValue, QueryCache};
use crate::domain::entities::{AnswerRecord, QuestionId, QuestionRecord, TimeRange};
use crate::domain::questions::{NewAnswer, NewQuestion, QuestionUpdate};

pub(crate) const METRIC_STORE_FALLBACK: &str = "faqbase_store_fallback_total";

const TARGET: &str = "faqbase::repository";

/// Where a read's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadSource {
    Cache,
    Store,
    /// The store failed or timed out; the value is the empty sentinel.
    Fallback,
    /// The input cannot match anything, so the store was not asked.
    Skipped,
}

impl ReadSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadSource::Cache => "cache",
            ReadSource::Store => "store",
            ReadSource::Fallback => "fallback",
            ReadSource::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome<T> {
    pub value: T,
    pub source: ReadSource,
}

impl<T> ReadOutcome<T> {
    fn new(value: T, source: ReadSource) -> Self {
        Self { value, source }
    }

    pub fn is_degraded(&self) -> bool {
        self.source == ReadSource::Fallback
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReadOutcome<U> {
        ReadOutcome {
            value: f(self.value),
            source: self.source,
        }
    }
}

/// Values the repository knows how to cache.
trait Cacheable: Sized {
    /// `None` means the value must not be cached.
    fn to_cached(&self) -> Option<CachedValue>;
    fn from_cached(value: CachedValue) -> Option<Self>;
    fn empty() -> Self;
}

impl Cacheable for Vec<QuestionRecord> {
    fn to_cached(&self) -> Option<CachedValue> {
        Some(CachedValue::Questions(self.clone()))
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Questions(questions) => Some(questions),
            _ => None,
        }
    }

    fn empty() -> Self {
        Vec::new()
    }
}

impl Cacheable for i64 {
    fn to_cached(&self) -> Option<CachedValue> {
        Some(CachedValue::Count(*self))
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Count(count) => Some(count),
            _ => None,
        }
    }

    fn empty() -> Self {
        0
    }
}

impl Cacheable for Option<QuestionRecord> {
    fn to_cached(&self) -> Option<CachedValue> {
        self.clone().map(CachedValue::Question)
    }

    fn from_cached(value: CachedValue) -> Option<Self> {
        match value {
            CachedValue::Question(question) => Some(Some(question)),
            _ => None,
        }
    }

    fn empty() -> Self {
        None
    }
}

pub struct KnowledgeBaseRepository {
    store: Arc<dyn QuestionStore>,
    cache: Arc<QueryCache>,
    store_timeout: Duration,
}

impl KnowledgeBaseRepository {
    pub fn new(
        store: Arc<dyn QuestionStore>,
        cache: Arc<QueryCache>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            store_timeout,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Every question, without answers attached.
    pub async fn all_questions(&self) -> ReadOutcome<Vec<QuestionRecord>> {
        let filter = QuestionFilter::default();
        self.read_through(CacheKey::AllQuestions, self.store.list_questions(&filter, false))
            .await
    }

    pub async fn questions_with_answers(&self) -> ReadOutcome<Vec<QuestionRecord>> {
        let filter = QuestionFilter::default();
        self.read_through(
            CacheKey::QuestionsWithAnswers,
            self.store.list_questions(&filter, true),
        )
        .await
    }

    pub async fn unanswered_questions(&self) -> ReadOutcome<Vec<QuestionRecord>> {
        let filter = QuestionFilter::answered(false);
        self.read_through(
            CacheKey::UnansweredQuestions,
            self.store.list_questions(&filter, true),
        )
        .await
    }

    /// Questions whose title or content mentions `category`.
    pub async fn questions_by_category(&self, category: &str) -> ReadOutcome<Vec<QuestionRecord>> {
        let filter = QuestionFilter::matching(&[category]);
        if filter.terms.is_empty() {
            return ReadOutcome::new(Vec::new(), ReadSource::Skipped);
        }
        self.read_through(
            CacheKey::by_category(category),
            self.store.list_questions(&filter, true),
        )
        .await
    }

    /// Questions whose title or content mentions any of `terms`.
    pub async fn questions_by_search_terms<S: AsRef<str>>(
        &self,
        terms: &[S],
    ) -> ReadOutcome<Vec<QuestionRecord>> {
        let filter = QuestionFilter::matching(terms);
        if filter.terms.is_empty() {
            return ReadOutcome::new(Vec::new(), ReadSource::Skipped);
        }
        self.read_through(
            CacheKey::by_search(terms),
            self.store.list_questions(&filter, true),
        )
        .await
    }

    /// Single question with its answers. Absence is never cached.
    pub async fn question_by_id(&self, id: QuestionId) -> ReadOutcome<Option<QuestionRecord>> {
        self.read_through(CacheKey::QuestionById(id), self.store.find_question(id))
            .await
    }

    pub async fn total_questions_count(&self) -> ReadOutcome<i64> {
        let filter = QuestionFilter::default();
        self.read_through(CacheKey::TotalCount, self.store.count_questions(&filter))
            .await
    }

    pub async fn answered_questions_count(&self) -> ReadOutcome<i64> {
        let filter = QuestionFilter::answered(true);
        self.read_through(CacheKey::AnsweredCount, self.store.count_questions(&filter))
            .await
    }

    pub async fn questions_count_by_category(&self, category: &str) -> ReadOutcome<i64> {
        let filter = QuestionFilter::matching(&[category]);
        if filter.terms.is_empty() {
            return ReadOutcome::new(0, ReadSource::Skipped);
        }
        self.read_through(
            CacheKey::count_by_category(category),
            self.store.count_questions(&filter),
        )
        .await
    }

    pub async fn questions_count_by_date_range(&self, range: TimeRange) -> ReadOutcome<i64> {
        if range.is_empty() {
            return ReadOutcome::new(0, ReadSource::Skipped);
        }
        let key = CacheKey::questions_in_range(&range);
        let filter = QuestionFilter::created_between(range);
        self.read_through(key, self.store.count_questions(&filter))
            .await
    }

    pub async fn answers_count_by_date_range(&self, range: TimeRange) -> ReadOutcome<i64> {
        if range.is_empty() {
            return ReadOutcome::new(0, ReadSource::Skipped);
        }
        self.read_through(
            CacheKey::answers_in_range(&range),
            self.store.count_answers(&range),
        )
        .await
    }

    pub async fn add_question(&self, question: &NewQuestion) -> Result<QuestionRecord, RepoError> {
        let created = self
            .with_timeout(self.store.insert_question(question))
            .await?;
        self.invalidate_after_write(Some(created.id));
        info!(target: TARGET, question_id = created.id, "Question stored");
        Ok(created)
    }

    pub async fn add_answer(&self, answer: &NewAnswer) -> Result<AnswerRecord, RepoError> {
        let created = self.with_timeout(self.store.insert_answer(answer)).await?;
        self.invalidate_after_write(Some(answer.question_id));
        info!(
            target: TARGET,
            question_id = answer.question_id,
            answer_id = created.id,
            "Answer stored"
        );
        Ok(created)
    }

    pub async fn update_question(
        &self,
        update: &QuestionUpdate,
    ) -> Result<QuestionRecord, RepoError> {
        let updated = self
            .with_timeout(self.store.update_question(update))
            .await?;
        self.invalidate_after_write(Some(update.id));
        info!(target: TARGET, question_id = update.id, "Question updated");
        Ok(updated)
    }

    pub async fn delete_question(&self, id: QuestionId) -> Result<bool, RepoError> {
        let deleted = self.with_timeout(self.store.delete_question(id)).await?;
        if deleted {
            self.invalidate_after_write(Some(id));
            info!(target: TARGET, question_id = id, "Question deleted");
        }
        Ok(deleted)
    }

    pub async fn health_check(&self) -> Result<(), RepoError> {
        self.with_timeout(self.store.health_check()).await
    }

    async fn read_through<T, F>(&self, key: CacheKey, fetch: F) -> ReadOutcome<T>
    where
        T: Cacheable,
        F: Future<Output = Result<T, RepoError>>,
    {
        if let Some(value) = self.cache.get(&key).and_then(T::from_cached) {
            return ReadOutcome::new(value, ReadSource::Cache);
        }

        match self.with_timeout(fetch).await {
            Ok(value) => {
                if let Some(cached) = value.to_cached() {
                    self.cache.insert(key, cached);
                }
                ReadOutcome::new(value, ReadSource::Store)
            }
            Err(err) => {
                warn!(
                    target: TARGET,
                    operation = key.operation(),
                    key = %key,
                    error = %err,
                    "Store read failed; answering with empty result"
                );
                counter!(METRIC_STORE_FALLBACK, "operation" => key.operation()).increment(1);
                ReadOutcome::new(T::empty(), ReadSource::Fallback)
            }
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, RepoError>
    where
        F: Future<Output = Result<T, RepoError>>,
    {
        tokio::time::timeout(self.store_timeout, fut)
            .await
            .unwrap_or(Err(RepoError::Timeout))
    }

    fn invalidate_after_write(&self, question: Option<QuestionId>) {
        let keys = CacheKey::affected_by_write(question);
        self.cache.invalidate_all(&keys);
    }
}
