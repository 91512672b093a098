//! Manager assistant: answers free-text queries and summarizes threads.
//!
//! An external text provider is tried first when one is configured. Any
//! provider failure, or its absence, falls back to the rule-based responses
//! below, so these operations always produce text.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Duration;
use tracing::{info, warn};

use crate::application::analysis::{KnowledgeBaseAnalysis, KnowledgeBaseService, answer_rate};
use crate::cache::Clock;
use crate::domain::categories::{inferred_category, rank_by_frequency};
use crate::domain::entities::{QuestionId, QuestionRecord};

const TARGET: &str = "faqbase::assistant";

pub const RELATED_ID_LIMIT: usize = 5;
const LISTED_QUESTIONS: usize = 3;
const CONTEXT_QUESTIONS: usize = 5;
const SUMMARY_TOPICS: usize = 3;
const MIN_SENTENCE_CHARS: usize = 20;
const ANSWER_PREVIEW_CHARS: usize = 100;

const KNOWN_CATEGORIES: &[&str] = &[
    "Password",
    "VPN",
    "Finance",
    "HR",
    "IT",
    "Software",
    "Hardware",
    "Network",
    "Email",
    "Benefits",
    "Onboarding",
    "Expense",
    "Travel",
];

const TOPIC_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "how", "what", "why", "when", "where",
];

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider answered with status {0}")]
    Status(u16),
    #[error("provider response could not be decoded: {0}")]
    Decode(String),
    #[error("provider returned no text")]
    Empty,
}

/// External text service used before the rule-based fallback.
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, ProviderError>;
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Ai,
    RuleBased,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub response: String,
    pub related_question_ids: Vec<QuestionId>,
    pub source: ReplySource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRequest {
    pub question_title: String,
    pub question_content: String,
    #[serde(default)]
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    CommonIssues,
    HowTo,
    Trends,
    General,
}

impl Intent {
    fn detect(query: &str) -> Self {
        let lowered = query.to_lowercase();
        let mentions = |needles: &[&str]| needles.iter().any(|needle| lowered.contains(needle));
        if mentions(&["common", "frequent", "often"]) {
            Self::CommonIssues
        } else if mentions(&["how to", "how do i", "how can i"]) {
            Self::HowTo
        } else if mentions(&["trend", "pattern", "analysis"]) {
            Self::Trends
        } else {
            Self::General
        }
    }
}

pub struct AssistantService {
    knowledge: Arc<KnowledgeBaseService>,
    provider: Option<Arc<dyn TextProvider>>,
    clock: Arc<dyn Clock>,
}

impl AssistantService {
    pub fn new(
        knowledge: Arc<KnowledgeBaseService>,
        provider: Option<Arc<dyn TextProvider>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            knowledge,
            provider,
            clock,
        }
    }

    pub async fn ask(&self, query: &str) -> AssistantReply {
        info!(target: TARGET, query_chars = query.chars().count(), "Assistant query received");
        let related = self.knowledge.relevant_questions(query).await;
        let related_question_ids = related
            .iter()
            .take(RELATED_ID_LIMIT)
            .map(|question| question.id)
            .collect();

        if let Some(provider) = &self.provider {
            let prompt = build_prompt(query, &related);
            match provider.generate(&prompt).await {
                Ok(response) => {
                    return AssistantReply {
                        response,
                        related_question_ids,
                        source: ReplySource::Ai,
                    };
                }
                Err(err) => {
                    warn!(
                        target: TARGET,
                        error = %err,
                        "Text generation failed; using rule-based reply"
                    );
                }
            }
        }

        AssistantReply {
            response: self.rule_based_reply(query, &related),
            related_question_ids,
            source: ReplySource::RuleBased,
        }
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> String {
        if let Some(provider) = &self.provider {
            match provider.summarize(&summary_input(request)).await {
                Ok(summary) => return summary,
                Err(err) => {
                    warn!(
                        target: TARGET,
                        error = %err,
                        "Summarization failed; using rule-based summary"
                    );
                }
            }
        }
        rule_based_summary(request)
    }

    fn rule_based_reply(&self, query: &str, related: &[QuestionRecord]) -> String {
        let categories = categories_in_query(query);
        let mut response = match Intent::detect(query) {
            Intent::CommonIssues => common_issues_reply(related, &categories),
            Intent::HowTo => how_to_reply(related),
            Intent::Trends => self.trends_reply(related),
            Intent::General => general_reply(related, query, &categories),
        };

        if related.is_empty() {
            response.push_str(
                "\n\nNo specific matches found in our knowledge base. Consider asking this question to the community.",
            );
        } else {
            response.push_str(&format!(
                "\n\nI found {} related questions in our knowledge base.",
                related.len()
            ));
        }
        response
    }

    fn trends_reply(&self, related: &[QuestionRecord]) -> String {
        if related.is_empty() {
            return "I can analyze trends in our knowledge base. Currently, there's not enough data for a comprehensive analysis.".to_string();
        }

        let since = self.clock.now() - Duration::days(30);
        let recent = related.iter().filter(|q| q.created_at >= since).count();

        let mut lines = vec![
            "**Knowledge Base Trends Analysis**\n".to_string(),
            format!("• Recent activity: {recent} questions in the last month"),
        ];
        let topics: Vec<String> = top_categories(related, 5)
            .into_iter()
            .map(|(category, _)| category)
            .collect();
        if !topics.is_empty() {
            lines.push(format!("• Most discussed topics: {}", topics.join(", ")));
        }
        let answered = related.iter().filter(|q| q.has_answers()).count();
        if answered > 0 {
            lines.push(format!(
                "• Answer rate: {:.1}% of questions have answers",
                answer_rate(answered, related.len())
            ));
        }
        lines.join("\n")
    }
}

/// Commentary on an analysis: engagement, size and top topics.
pub fn insights(analysis: &KnowledgeBaseAnalysis) -> String {
    let mut parts = Vec::new();

    parts.push(if analysis.answer_rate > 70.0 {
        "Excellent community engagement with high answer rate".to_string()
    } else if analysis.answer_rate > 50.0 {
        "Good community participation with moderate answer rate".to_string()
    } else {
        "Opportunity to improve community engagement".to_string()
    });

    parts.push(if analysis.total_questions > 100 {
        "Comprehensive knowledge base with extensive coverage".to_string()
    } else if analysis.total_questions > 50 {
        "Growing knowledge base with good content diversity".to_string()
    } else {
        "Knowledge base is developing, consider adding more content".to_string()
    });

    if !analysis.popular_categories.is_empty() {
        let top: Vec<&str> = analysis
            .popular_categories
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        parts.push(format!("Top topics include: {}", top.join(", ")));
    }

    format!("{}.", parts.join(". "))
}

pub fn rule_based_summary(request: &SummaryRequest) -> String {
    let topics = key_topics(&format!(
        "{} {}",
        request.question_title, request.question_content
    ));
    let opening = format!("This discussion focuses on {}. ", topics.join(", "));

    let digest = match request.answers.as_slice() {
        [] => "The question has not received any answers yet.".to_string(),
        [only] => format!("One solution was provided: {}", summarize_answer(only)),
        answers => {
            let points: Vec<String> = answers
                .iter()
                .take(3)
                .enumerate()
                .map(|(index, answer)| format!("{}) {}", index + 1, summarize_answer(answer)))
                .collect();
            format!(
                "Among {} responses, key suggestions include: {}",
                answers.len(),
                points.join("; ")
            )
        }
    };

    opening + &digest
}

fn summary_input(request: &SummaryRequest) -> String {
    let mut text = format!("{}. {}", request.question_title, request.question_content);
    if !request.answers.is_empty() {
        text.push_str(" Answers: ");
        text.push_str(&request.answers.join(" "));
    }
    text
}

/// First three distinct longer words of `text`.
fn key_topics(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() > 3 && !TOPIC_STOP_WORDS.contains(&word.as_str()))
        .filter(|word| seen.insert(word.clone()))
        .take(SUMMARY_TOPICS)
        .collect()
}

/// First sentence long enough to carry meaning, else a truncated preview.
fn summarize_answer(answer: &str) -> String {
    match answer
        .split('.')
        .map(str::trim)
        .find(|sentence| sentence.chars().count() > MIN_SENTENCE_CHARS)
    {
        Some(sentence) => format!("{sentence}."),
        None => preview(answer),
    }
}

fn preview(answer: &str) -> String {
    if answer.chars().count() <= ANSWER_PREVIEW_CHARS {
        return answer.to_string();
    }
    let cut: String = answer.chars().take(ANSWER_PREVIEW_CHARS).collect();
    format!("{cut}...")
}

fn categories_in_query(query: &str) -> Vec<&'static str> {
    let lowered = query.to_lowercase();
    KNOWN_CATEGORIES
        .iter()
        .copied()
        .filter(|category| lowered.contains(&category.to_lowercase()))
        .collect()
}

/// Inferred categories of `questions`, most frequent first.
fn top_categories(questions: &[QuestionRecord], limit: usize) -> Vec<(String, usize)> {
    rank_by_frequency(questions.iter().filter_map(inferred_category), limit)
}

fn common_issues_reply(related: &[QuestionRecord], categories: &[&str]) -> String {
    let mut lines = vec![if categories.is_empty() {
        "Based on our knowledge base, here are common discussion topics:\n".to_string()
    } else {
        format!(
            "Based on questions about {}, here are common topics:\n",
            categories.join(", ")
        )
    }];

    let top = top_categories(related, 3);
    if top.is_empty() {
        lines.push("• IT Support: Various technical issues".to_string());
        lines.push("• HR Processes: Employee-related questions".to_string());
        lines.push("• Finance: Expense and reimbursement topics".to_string());
    } else {
        for (category, count) in top {
            let example = related
                .iter()
                .find(|q| inferred_category(q).as_deref() == Some(category.as_str()))
                .map(|q| q.title.as_str())
                .unwrap_or_default();
            lines.push(format!(
                "• **{category}**: {count} questions (e.g., \"{example}\")"
            ));
        }
    }
    lines.join("\n")
}

fn how_to_reply(related: &[QuestionRecord]) -> String {
    if related.is_empty() {
        return "I can help with procedural questions. Based on your query, here are some common how-to topics in our knowledge base: IT procedures, HR processes, and finance guidelines.".to_string();
    }

    let mut lines = vec!["Here are some solutions from our knowledge base:\n".to_string()];
    let answered: Vec<&QuestionRecord> = related
        .iter()
        .filter(|q| q.has_answers())
        .take(LISTED_QUESTIONS)
        .collect();
    if answered.is_empty() {
        lines.push("• Check our IT documentation for technical procedures".to_string());
        lines.push("• Review HR guidelines for employee-related processes".to_string());
        lines.push("• Consult finance department for expense-related questions".to_string());
    } else {
        for question in answered {
            let best = question
                .answers
                .iter()
                .max_by_key(|answer| answer.content.chars().count())
                .map(|answer| summarize_answer(&answer.content))
                .unwrap_or_default();
            lines.push(format!("• **{}**: {best}", question.title));
        }
    }
    lines.join("\n")
}

fn general_reply(related: &[QuestionRecord], query: &str, categories: &[&str]) -> String {
    if related.is_empty() {
        return format!(
            "I understand you're asking about \"{query}\". While I don't have specific information on this topic in our knowledge base yet, this would be a great question to ask our community."
        );
    }

    let mut lines = vec![if categories.is_empty() {
        format!(
            "Based on your question about \"{query}\", I found relevant information in our knowledge base:\n"
        )
    } else {
        format!(
            "Based on your question about {}, I found relevant information:\n",
            categories.join(", ")
        )
    }];
    for question in related.iter().take(LISTED_QUESTIONS) {
        lines.push(format!("• **{}**", question.title));
        if question.has_answers() {
            lines.push(format!("  - {} answers available", question.answers.len()));
        }
        if let Some(category) = inferred_category(question) {
            lines.push(format!("  - Category: {category}"));
        }
    }
    lines.join("\n")
}

fn build_prompt(query: &str, related: &[QuestionRecord]) -> String {
    let mut context = vec!["Knowledge Base Context:\n".to_string()];
    for question in related.iter().take(CONTEXT_QUESTIONS) {
        context.push(format!("Q: {}", question.title));
        context.push(format!(
            "A: {}\n",
            question
                .answers
                .first()
                .map(|answer| answer.content.as_str())
                .unwrap_or("No answers yet")
        ));
    }

    format!(
        "You are a helpful assistant for a company knowledge base. Use the following context from existing questions and answers to respond helpfully.\n{}\nUser Question: {query}\nPlease provide a helpful response based on the knowledge base context. If the context doesn't contain relevant information, suggest asking the community. Keep your response concise and practical.",
        context.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(answers: &[&str]) -> SummaryRequest {
        SummaryRequest {
            question_title: "Cannot connect to VPN".to_string(),
            question_content: "The client times out after login".to_string(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn intent_follows_keyword_priority() {
        assert_eq!(Intent::detect("What are common VPN issues?"), Intent::CommonIssues);
        assert_eq!(Intent::detect("How do I reset my password"), Intent::HowTo);
        assert_eq!(Intent::detect("Show me a trend"), Intent::Trends);
        assert_eq!(Intent::detect("printer"), Intent::General);
        assert_eq!(Intent::detect("how to spot a common pattern"), Intent::CommonIssues);
    }

    #[test]
    fn query_categories_are_matched_case_insensitively() {
        assert_eq!(
            categories_in_query("vpn and expense questions"),
            vec!["VPN", "Expense"]
        );
    }

    #[test]
    fn summary_without_answers() {
        assert_eq!(
            rule_based_summary(&request(&[])),
            "This discussion focuses on cannot, connect, client. The question has not received any answers yet."
        );
    }

    #[test]
    fn summary_with_one_answer_uses_first_meaningful_sentence() {
        let summary = rule_based_summary(&request(&["Ok. Reinstall the client from the portal. Then retry."]));
        assert!(summary.ends_with("One solution was provided: Reinstall the client from the portal."));
    }

    #[test]
    fn summary_with_many_answers_lists_points() {
        let summary = rule_based_summary(&request(&[
            "Reinstall the client from the portal.",
            "short",
        ]));
        assert!(summary.ends_with(
            "Among 2 responses, key suggestions include: 1) Reinstall the client from the portal.; 2) short"
        ));
    }

    #[test]
    fn insights_cover_rate_size_and_topics() {
        let analysis = KnowledgeBaseAnalysis {
            total_questions: 60,
            answer_rate: 75.0,
            popular_categories: vec!["Vpn".into(), "Password".into(), "Email".into(), "Laptop".into()],
            ..Default::default()
        };
        assert_eq!(
            insights(&analysis),
            "Excellent community engagement with high answer rate. Growing knowledge base with good content diversity. Top topics include: Vpn, Password, Email."
        );

        let empty = KnowledgeBaseAnalysis::default();
        assert_eq!(
            insights(&empty),
            "Opportunity to improve community engagement. Knowledge base is developing, consider adding more content."
        );
    }

    #[test]
    fn answer_without_long_sentence_falls_back_to_preview() {
        assert_eq!(summarize_answer("Yes. Works now."), "Yes. Works now.");

        let rambling = format!("{}. ok", "word ".repeat(4).trim());
        assert_eq!(summarize_answer(&rambling), rambling);

        let long = "ab. ".repeat(40);
        assert_eq!(summarize_answer(&long), format!("{}...", &long[..100]));
    }
}
