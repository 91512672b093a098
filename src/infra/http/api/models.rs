use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::application::analysis::KnowledgeBaseAnalysis;

#[derive(Debug, Deserialize, Serialize)]
pub struct QuestionCreateRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QuestionUpdateRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AnswerCreateRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub insights: String,
    pub statistics: KnowledgeBaseAnalysis,
    pub popular_categories: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}
