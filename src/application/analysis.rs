//! Knowledge-base analysis: relevance lookup, category statistics and
//! weekly activity.
//!
//! Every figure is computed from its own repository read, so a failing read
//! blanks only the figure that depends on it.

use std::sync::Arc;

use serde::Serialize;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::application::knowledge_base::{KnowledgeBaseRepository, ReadOutcome};
use crate::cache::Clock;
use crate::domain::categories::extract_categories;
use crate::domain::entities::{QuestionRecord, TimeRange};
use crate::domain::scoring::{RELEVANT_LIMIT, rank_relevant};
use crate::domain::text::query_terms;

pub const CATEGORY_STATS_LIMIT: usize = 10;
pub const UNANSWERED_LIMIT: usize = 20;
pub const ACTIVITY_WEEKS: i64 = 4;
/// Activity windows end on this boundary so repeated analyses reuse the
/// cached date-range counts.
pub const ACTIVITY_ALIGNMENT: Duration = Duration::MINUTE;

const TARGET: &str = "faqbase::analysis";

const WEEK_LABEL_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:short] [day]");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub questions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyActivity {
    pub period: String,
    pub questions: i64,
    pub answers: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KnowledgeBaseAnalysis {
    pub total_questions: usize,
    pub answered_questions: usize,
    pub unanswered_questions: usize,
    pub answer_rate: f64,
    pub average_answers_per_question: f64,
    pub popular_categories: Vec<String>,
    pub category_stats: Vec<CategoryStat>,
    pub recent_activity: Vec<WeeklyActivity>,
    pub suggested_categories: Vec<String>,
    /// At least one underlying read fell back to an empty result.
    pub degraded: bool,
}

/// Percentage of answered questions; 0 for an empty knowledge base.
pub fn answer_rate(answered: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        answered as f64 / total as f64 * 100.0
    }
}

/// Mean answers over answered questions; 0 when none are answered.
pub fn average_answers(total_answers: usize, answered: usize) -> f64 {
    if answered == 0 {
        0.0
    } else {
        total_answers as f64 / answered as f64
    }
}

/// The trailing weekly windows ending at `now`, oldest first.
pub fn activity_windows(now: OffsetDateTime) -> Vec<(String, TimeRange)> {
    (0..ACTIVITY_WEEKS)
        .rev()
        .map(|weeks_back| {
            let end = now - Duration::weeks(weeks_back);
            let start = end - Duration::weeks(1);
            (week_label(start, end), TimeRange::new(start, end))
        })
        .collect()
}

/// Truncates `at` to the previous multiple of `step` since the Unix epoch.
pub fn align_down(at: OffsetDateTime, step: Duration) -> OffsetDateTime {
    let step_nanos = step.whole_nanoseconds();
    if step_nanos <= 0 {
        return at;
    }
    let nanos = at.unix_timestamp_nanos();
    let aligned = nanos - nanos.rem_euclid(step_nanos);
    OffsetDateTime::from_unix_timestamp_nanos(aligned).unwrap_or(at)
}

fn week_label(start: OffsetDateTime, end: OffsetDateTime) -> String {
    let format = |at: OffsetDateTime| at.format(WEEK_LABEL_FORMAT).unwrap_or_default();
    format!("{} - {}", format(start), format(end))
}

fn most_recent(mut questions: Vec<QuestionRecord>, limit: usize) -> Vec<QuestionRecord> {
    questions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    questions.truncate(limit);
    questions
}

pub struct KnowledgeBaseService {
    repository: Arc<KnowledgeBaseRepository>,
    clock: Arc<dyn Clock>,
}

impl KnowledgeBaseService {
    pub fn new(repository: Arc<KnowledgeBaseRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn repository(&self) -> &KnowledgeBaseRepository {
        &self.repository
    }

    /// Best matches for a free-text query; the newest questions for a blank one.
    pub async fn relevant_questions(&self, query: &str) -> Vec<QuestionRecord> {
        let terms = query_terms(query);
        if terms.is_empty() {
            let all = self.repository.questions_with_answers().await.into_value();
            return most_recent(all, RELEVANT_LIMIT);
        }

        let candidates = self
            .repository
            .questions_by_search_terms(&terms)
            .await
            .into_value();
        debug!(
            target: TARGET,
            terms = terms.len(),
            candidates = candidates.len(),
            "Ranking relevant questions"
        );
        rank_relevant(candidates, &terms)
    }

    pub async fn analyze(&self, category: Option<&str>) -> KnowledgeBaseAnalysis {
        let scope = match category.map(str::trim).filter(|value| !value.is_empty()) {
            Some(category) => self.repository.questions_by_category(category).await,
            None => self.repository.questions_with_answers().await,
        };
        let mut degraded = scope.is_degraded();
        let questions = scope.into_value();

        let total_questions = questions.len();
        let answered_questions = questions.iter().filter(|q| q.has_answers()).count();
        let total_answers: usize = questions.iter().map(|q| q.answers.len()).sum();

        let (category_stats, stats_degraded) = self.category_statistics_outcome().await;
        degraded |= stats_degraded;
        let suggested = self.repository.all_questions().await;
        degraded |= suggested.is_degraded();
        let (recent_activity, activity_degraded) = self.recent_activity().await;
        degraded |= activity_degraded;

        if degraded {
            warn!(target: TARGET, ?category, "Analysis built from partially failed reads");
        }

        KnowledgeBaseAnalysis {
            total_questions,
            answered_questions,
            unanswered_questions: total_questions - answered_questions,
            answer_rate: answer_rate(answered_questions, total_questions),
            average_answers_per_question: average_answers(total_answers, answered_questions),
            popular_categories: extract_categories(&questions),
            category_stats,
            recent_activity,
            suggested_categories: extract_categories(&suggested.value),
            degraded,
        }
    }

    pub async fn questions_by_category(&self, category: &str) -> Vec<QuestionRecord> {
        self.repository
            .questions_by_category(category)
            .await
            .into_value()
    }

    /// Question counts for the ten most frequent categories.
    pub async fn category_statistics(&self) -> Vec<CategoryStat> {
        self.category_statistics_outcome().await.0
    }

    /// The twenty most recent unanswered questions.
    pub async fn unanswered_questions(&self) -> Vec<QuestionRecord> {
        let unanswered = self.repository.unanswered_questions().await.into_value();
        most_recent(unanswered, UNANSWERED_LIMIT)
    }

    pub async fn answer_rate(&self) -> f64 {
        let total = self.repository.total_questions_count().await.into_value();
        if total <= 0 {
            return 0.0;
        }
        let answered = self.repository.answered_questions_count().await.into_value();
        answered as f64 / total as f64 * 100.0
    }

    /// Suggested categories across the whole knowledge base.
    pub async fn extract_categories(&self) -> Vec<String> {
        let questions = self.repository.all_questions().await.into_value();
        extract_categories(&questions)
    }

    async fn category_statistics_outcome(&self) -> (Vec<CategoryStat>, bool) {
        let questions = self.repository.all_questions().await;
        let mut degraded = questions.is_degraded();

        let mut stats = Vec::new();
        for category in extract_categories(&questions.value)
            .into_iter()
            .take(CATEGORY_STATS_LIMIT)
        {
            let count: ReadOutcome<i64> = self
                .repository
                .questions_count_by_category(&category)
                .await;
            degraded |= count.is_degraded();
            stats.push(CategoryStat {
                category,
                questions: count.value,
            });
        }
        (stats, degraded)
    }

    async fn recent_activity(&self) -> (Vec<WeeklyActivity>, bool) {
        let mut degraded = false;
        let mut activity = Vec::new();
        let now = align_down(self.clock.now(), ACTIVITY_ALIGNMENT);
        for (period, range) in activity_windows(now) {
            let questions = self.repository.questions_count_by_date_range(range).await;
            let answers = self.repository.answers_count_by_date_range(range).await;
            degraded |= questions.is_degraded() || answers.is_degraded();
            activity.push(WeeklyActivity {
                period,
                questions: questions.value,
                answers: answers.value,
            });
        }
        (activity, degraded)
    }
}
