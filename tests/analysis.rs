mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use faqbase::application::assistant::{
    AssistantService, ProviderError, ReplySource, SummaryRequest, TextProvider, insights,
    rule_based_summary,
};
use faqbase::cache::Clock;
use support::Harness;
use time::Duration;
use time::macros::datetime;

/// Knowledge base used by most tests: two answered VPN questions and one
/// unanswered printer question spread over March 2024.
fn seeded() -> Harness {
    let harness = Harness::new();
    let store = &harness.store;

    let vpn = store.seed_question(
        "VPN password reset",
        "Password expired on VPN",
        datetime!(2024-03-28 09:00 UTC),
    );
    store.seed_answer(
        vpn,
        "Use the self-service portal to reset it.",
        datetime!(2024-03-28 10:00 UTC),
    );
    store.seed_answer(vpn, "Call the helpdesk.", datetime!(2024-03-28 11:00 UTC));

    store.seed_question(
        "Printer offline",
        "Office printer shows offline",
        datetime!(2024-03-10 09:00 UTC),
    );

    let drops = store.seed_question(
        "VPN disconnects",
        "VPN drops every hour",
        datetime!(2024-03-20 09:00 UTC),
    );
    store.seed_answer(
        drops,
        "Update the client to the latest release.",
        datetime!(2024-03-21 09:00 UTC),
    );

    harness
}

#[tokio::test]
async fn analysis_reports_totals_and_rates() {
    let harness = seeded();

    let analysis = harness.knowledge.analyze(None).await;

    assert_eq!(analysis.total_questions, 3);
    assert_eq!(analysis.answered_questions, 2);
    assert_eq!(analysis.unanswered_questions, 1);
    assert!((analysis.answer_rate - 200.0 / 3.0).abs() < 1e-9);
    assert!((analysis.average_answers_per_question - 1.5).abs() < 1e-9);
    assert_eq!(
        &analysis.popular_categories[..3],
        &["Password", "Printer", "Offline"]
    );
    assert!(!analysis.degraded);
}

#[tokio::test]
async fn analysis_buckets_recent_activity_by_week() {
    let harness = seeded();

    let activity = harness.knowledge.analyze(None).await.recent_activity;

    let periods: Vec<&str> = activity.iter().map(|week| week.period.as_str()).collect();
    assert_eq!(
        periods,
        vec!["Mar 01 - Mar 08", "Mar 08 - Mar 15", "Mar 15 - Mar 22", "Mar 22 - Mar 29"]
    );
    let questions: Vec<i64> = activity.iter().map(|week| week.questions).collect();
    let answers: Vec<i64> = activity.iter().map(|week| week.answers).collect();
    assert_eq!(questions, vec![0, 1, 1, 1]);
    assert_eq!(answers, vec![0, 0, 1, 2]);
}

#[tokio::test]
async fn category_scope_limits_the_analysis() {
    let harness = seeded();

    let analysis = harness.knowledge.analyze(Some("vpn")).await;

    assert_eq!(analysis.total_questions, 2);
    assert_eq!(analysis.answered_questions, 2);
    assert_eq!(analysis.answer_rate, 100.0);
    assert!(!analysis.suggested_categories.is_empty());
}

#[tokio::test]
async fn category_statistics_count_matching_questions() {
    let harness = seeded();

    let stats = harness.knowledge.category_statistics().await;

    assert!(stats.len() <= 10);
    assert_eq!(stats[0].category, "Password");
    assert_eq!(stats[0].questions, 1);
    assert!(stats.iter().any(|stat| stat.category == "Printer" && stat.questions == 1));
}

#[tokio::test]
async fn empty_knowledge_base_analyzes_to_zeroes() {
    let harness = Harness::new();

    let analysis = harness.knowledge.analyze(None).await;

    assert_eq!(analysis.total_questions, 0);
    assert_eq!(analysis.answer_rate, 0.0);
    assert_eq!(analysis.average_answers_per_question, 0.0);
    assert!(analysis.popular_categories.is_empty());
    assert_eq!(analysis.recent_activity.len(), 4);
    assert_eq!(harness.knowledge.answer_rate().await, 0.0);
}

#[tokio::test]
async fn failing_store_marks_analysis_degraded() {
    let harness = seeded();
    harness.store.set_failing(true);

    let analysis = harness.knowledge.analyze(None).await;

    assert!(analysis.degraded);
    assert_eq!(analysis.total_questions, 0);
    assert!(analysis.category_stats.is_empty());
}

#[tokio::test]
async fn activity_failure_keeps_category_figures() {
    let harness = seeded();
    harness.store.fail_operation("count_answers");

    let analysis = harness.knowledge.analyze(None).await;

    assert!(analysis.degraded);
    assert_eq!(analysis.total_questions, 3);
    assert_eq!(
        &analysis.popular_categories[..3],
        &["Password", "Printer", "Offline"]
    );
    assert_eq!(analysis.category_stats[0].category, "Password");
    assert_eq!(analysis.category_stats[0].questions, 1);
    let questions: Vec<i64> = analysis.recent_activity.iter().map(|week| week.questions).collect();
    let answers: Vec<i64> = analysis.recent_activity.iter().map(|week| week.answers).collect();
    assert_eq!(questions, vec![0, 1, 1, 1]);
    assert_eq!(answers, vec![0, 0, 0, 0]);
}

#[tokio::test]
async fn repeated_analysis_within_a_minute_reuses_activity_counts() {
    let harness = seeded();

    harness.knowledge.analyze(None).await;
    assert_eq!(harness.store.calls("count_answers"), 4);

    harness.clock.advance(Duration::seconds(30));
    harness.knowledge.analyze(None).await;
    assert_eq!(harness.store.calls("count_answers"), 4);

    harness.clock.advance(Duration::seconds(30));
    harness.knowledge.analyze(None).await;
    assert_eq!(harness.store.calls("count_answers"), 8);
}

#[tokio::test]
async fn relevant_questions_rank_by_score() {
    let harness = seeded();

    let related = harness.knowledge.relevant_questions("VPN disconnects").await;

    let ids: Vec<i64> = related.iter().map(|question| question.id).collect();
    assert_eq!(ids, vec![3, 1]);
}

#[tokio::test]
async fn blank_query_returns_newest_questions() {
    let harness = seeded();

    let related = harness.knowledge.relevant_questions("   ").await;

    let ids: Vec<i64> = related.iter().map(|question| question.id).collect();
    assert_eq!(ids, vec![1, 3, 2]);
}

#[tokio::test]
async fn unanswered_questions_and_rate() {
    let harness = seeded();

    let unanswered = harness.knowledge.unanswered_questions().await;
    assert_eq!(unanswered.len(), 1);
    assert_eq!(unanswered[0].title, "Printer offline");

    let rate = harness.knowledge.answer_rate().await;
    assert!((rate - 200.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn insights_mention_engagement_and_topics() {
    let harness = seeded();
    let analysis = harness.knowledge.analyze(None).await;

    let text = insights(&analysis);

    assert!(text.starts_with("Good community participation with moderate answer rate."));
    assert!(text.contains("Knowledge base is developing"));
    assert!(text.contains("Top topics include: Password, Printer, Offline"));
    assert!(text.ends_with('.'));
}

struct ScriptedProvider {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn respond(&self) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().ok_or(ProviderError::Status(503))
    }
}

#[async_trait]
impl TextProvider for ScriptedProvider {
    async fn summarize(&self, _text: &str) -> Result<String, ProviderError> {
        self.respond()
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.respond()
    }
}

fn assistant(harness: &Harness, provider: Option<Arc<ScriptedProvider>>) -> AssistantService {
    let clock: Arc<dyn Clock> = harness.clock.clone();
    AssistantService::new(
        harness.knowledge.clone(),
        provider.map(|provider| provider as Arc<dyn TextProvider>),
        clock,
    )
}

#[tokio::test]
async fn ask_without_provider_uses_rule_based_reply() {
    let harness = seeded();
    let service = assistant(&harness, None);

    let reply = service.ask("common vpn problems").await;

    assert_eq!(reply.source, ReplySource::RuleBased);
    assert_eq!(reply.related_question_ids, vec![1, 3]);
    assert!(reply.response.starts_with("Based on questions about VPN"));
    assert!(reply.response.ends_with("I found 2 related questions in our knowledge base."));
}

#[tokio::test]
async fn ask_prefers_provider_text() {
    let harness = seeded();
    let provider = ScriptedProvider::answering("Restart the VPN client.");
    let service = assistant(&harness, Some(provider.clone()));

    let reply = service.ask("vpn").await;

    assert_eq!(reply.source, ReplySource::Ai);
    assert_eq!(reply.response, "Restart the VPN client.");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn provider_failure_falls_back_to_rules() {
    let harness = seeded();
    let service = assistant(&harness, Some(ScriptedProvider::failing()));

    let reply = service.ask("quantum entanglement").await;

    assert_eq!(reply.source, ReplySource::RuleBased);
    assert!(reply.related_question_ids.is_empty());
    assert!(reply.response.contains("No specific matches found"));
}

#[tokio::test]
async fn summarize_falls_back_when_provider_fails() {
    let harness = seeded();
    let service = assistant(&harness, Some(ScriptedProvider::failing()));
    let request = SummaryRequest {
        question_title: "Printer offline".to_string(),
        question_content: "Office printer shows offline".to_string(),
        answers: Vec::new(),
    };

    let summary = service.summarize(&request).await;

    assert_eq!(summary, rule_based_summary(&request));
    assert!(summary.ends_with("The question has not received any answers yet."));
}

#[tokio::test]
async fn summarize_uses_provider_when_available() {
    let harness = seeded();
    let service = assistant(&harness, Some(ScriptedProvider::answering("Printer needs a reboot.")));
    let request = SummaryRequest {
        question_title: "Printer offline".to_string(),
        question_content: "Office printer shows offline".to_string(),
        answers: vec!["Reboot it.".to_string()],
    };

    assert_eq!(service.summarize(&request).await, "Printer needs a reboot.");
}
