//! In-memory question store and wiring shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use faqbase::application::analysis::KnowledgeBaseService;
use faqbase::application::knowledge_base::KnowledgeBaseRepository;
use faqbase::application::repos::{QuestionFilter, QuestionStore, RepoError};
use faqbase::cache::{CacheConfig, Clock, ManualClock, QueryCache};
use faqbase::domain::entities::{AnswerRecord, QuestionId, QuestionRecord, TimeRange};
use faqbase::domain::questions::{NewAnswer, NewQuestion, QuestionUpdate};
use time::OffsetDateTime;
use time::macros::datetime;
use uuid::Uuid;

pub const START: OffsetDateTime = datetime!(2024-03-29 12:00 UTC);

#[derive(Default)]
struct Data {
    questions: BTreeMap<QuestionId, QuestionRecord>,
    next_question_id: QuestionId,
    next_answer_id: i64,
}

/// Question store double with per-operation call counters, failure injection
/// and an optional artificial delay.
pub struct FakeStore {
    clock: Arc<ManualClock>,
    data: Mutex<Data>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: AtomicBool,
    failing_operations: Mutex<HashSet<&'static str>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeStore {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            data: Mutex::new(Data::default()),
            calls: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            failing_operations: Mutex::new(HashSet::new()),
            delay: Mutex::new(None),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail only calls to `operation`, leaving every other store call intact.
    pub fn fail_operation(&self, operation: &'static str) {
        self.failing_operations
            .lock()
            .expect("failing operations lock")
            .insert(operation);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().expect("delay lock") = delay;
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("calls lock").values().sum()
    }

    /// Insert a question directly, bypassing the repository and its cache.
    pub fn seed_question(
        &self,
        title: &str,
        content: &str,
        created_at: OffsetDateTime,
    ) -> QuestionId {
        let mut data = self.data.lock().expect("data lock");
        data.next_question_id += 1;
        let id = data.next_question_id;
        data.questions.insert(
            id,
            QuestionRecord {
                id,
                title: title.to_string(),
                content: content.to_string(),
                created_by: Uuid::nil(),
                created_at,
                answers: Vec::new(),
            },
        );
        id
    }

    pub fn seed_answer(&self, question_id: QuestionId, content: &str, created_at: OffsetDateTime) {
        let mut data = self.data.lock().expect("data lock");
        data.next_answer_id += 1;
        let id = data.next_answer_id;
        let question = data
            .questions
            .get_mut(&question_id)
            .expect("seeded answer needs an existing question");
        question.answers.push(AnswerRecord {
            id,
            question_id,
            content: content.to_string(),
            created_by: Uuid::nil(),
            created_at,
        });
    }

    async fn enter(&self, operation: &'static str) -> Result<(), RepoError> {
        *self
            .calls
            .lock()
            .expect("calls lock")
            .entry(operation)
            .or_default() += 1;

        let delay = *self.delay.lock().expect("delay lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let operation_fails = self
            .failing_operations
            .lock()
            .expect("failing operations lock")
            .contains(operation);
        if operation_fails || self.failing.load(Ordering::SeqCst) {
            Err(RepoError::from_persistence("injected store failure"))
        } else {
            Ok(())
        }
    }
}

fn matches(question: &QuestionRecord, filter: &QuestionFilter) -> bool {
    if let Some(answered) = filter.answered
        && question.has_answers() != answered
    {
        return false;
    }

    if !filter.terms.is_empty() {
        let title = question.title.to_lowercase();
        let content = question.content.to_lowercase();
        if !filter
            .terms
            .iter()
            .any(|term| title.contains(term.as_str()) || content.contains(term.as_str()))
        {
            return false;
        }
    }

    match filter.created_between {
        Some(range) => range.contains(question.created_at),
        None => true,
    }
}

#[async_trait]
impl QuestionStore for FakeStore {
    async fn list_questions(
        &self,
        filter: &QuestionFilter,
        include_answers: bool,
    ) -> Result<Vec<QuestionRecord>, RepoError> {
        self.enter("list_questions").await?;
        let data = self.data.lock().expect("data lock");
        Ok(data
            .questions
            .values()
            .filter(|question| matches(question, filter))
            .cloned()
            .map(|mut question| {
                if !include_answers {
                    question.answers.clear();
                }
                question
            })
            .collect())
    }

    async fn count_questions(&self, filter: &QuestionFilter) -> Result<i64, RepoError> {
        self.enter("count_questions").await?;
        let data = self.data.lock().expect("data lock");
        Ok(data
            .questions
            .values()
            .filter(|question| matches(question, filter))
            .count() as i64)
    }

    async fn count_answers(&self, range: &TimeRange) -> Result<i64, RepoError> {
        self.enter("count_answers").await?;
        let data = self.data.lock().expect("data lock");
        Ok(data
            .questions
            .values()
            .flat_map(|question| question.answers.iter())
            .filter(|answer| range.contains(answer.created_at))
            .count() as i64)
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<QuestionRecord>, RepoError> {
        self.enter("find_question").await?;
        Ok(self.data.lock().expect("data lock").questions.get(&id).cloned())
    }

    async fn insert_question(&self, question: &NewQuestion) -> Result<QuestionRecord, RepoError> {
        self.enter("insert_question").await?;
        let mut data = self.data.lock().expect("data lock");
        data.next_question_id += 1;
        let record = QuestionRecord {
            id: data.next_question_id,
            title: question.title.clone(),
            content: question.content.clone(),
            created_by: question.created_by,
            created_at: self.clock.now(),
            answers: Vec::new(),
        };
        data.questions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn insert_answer(&self, answer: &NewAnswer) -> Result<AnswerRecord, RepoError> {
        self.enter("insert_answer").await?;
        let mut data = self.data.lock().expect("data lock");
        data.next_answer_id += 1;
        let record = AnswerRecord {
            id: data.next_answer_id,
            question_id: answer.question_id,
            content: answer.content.clone(),
            created_by: answer.created_by,
            created_at: self.clock.now(),
        };
        let question = data
            .questions
            .get_mut(&answer.question_id)
            .ok_or(RepoError::NotFound)?;
        question.answers.push(record.clone());
        Ok(record)
    }

    async fn update_question(&self, update: &QuestionUpdate) -> Result<QuestionRecord, RepoError> {
        self.enter("update_question").await?;
        let mut data = self.data.lock().expect("data lock");
        let question = data
            .questions
            .get_mut(&update.id)
            .ok_or(RepoError::NotFound)?;
        question.title = update.title.clone();
        question.content = update.content.clone();
        Ok(question.clone())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool, RepoError> {
        self.enter("delete_question").await?;
        Ok(self
            .data
            .lock()
            .expect("data lock")
            .questions
            .remove(&id)
            .is_some())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.enter("health_check").await
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<FakeStore>,
    pub cache: Arc<QueryCache>,
    pub repository: Arc<KnowledgeBaseRepository>,
    pub knowledge: Arc<KnowledgeBaseService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    pub fn with_timeout(store_timeout: Duration) -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let store = Arc::new(FakeStore::new(clock.clone()));
        let cache = Arc::new(QueryCache::new(&CacheConfig::default(), clock.clone()));
        let repository = Arc::new(KnowledgeBaseRepository::new(
            store.clone(),
            cache.clone(),
            store_timeout,
        ));
        let knowledge = Arc::new(KnowledgeBaseService::new(repository.clone(), clock.clone()));

        Self {
            clock,
            store,
            cache,
            repository,
            knowledge,
        }
    }
}
