use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::application::access::{Principal, Role};
use crate::application::assistant::{SummaryRequest, insights};
use crate::application::knowledge_base::{ReadOutcome, ReadSource};
use crate::domain::entities::QuestionId;

use super::READ_SOURCE_HEADER;
use super::error::{ApiError, question_to_api};
use super::models::*;
use super::state::ApiState;

const TARGET: &str = "faqbase::http::api";

fn require(principal: &Principal, role: Role) -> Result<(), ApiError> {
    principal.requires(role).map_err(|_| ApiError::forbidden())
}

fn with_read_source(mut response: Response, source: ReadSource) -> Response {
    response.headers_mut().insert(
        READ_SOURCE_HEADER,
        HeaderValue::from_static(source.as_str()),
    );
    response
}

/// -------- Questions --------
pub async fn list_questions(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, ApiError> {
    require(&principal, Role::Member)?;

    let ReadOutcome { value, source } = state.questions.list().await;
    Ok(with_read_source(Json(value).into_response(), source))
}

pub async fn get_question(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuestionId>,
) -> Result<Response, ApiError> {
    require(&principal, Role::Member)?;

    let outcome = state.questions.get(id).await;
    let source = outcome.source;
    match outcome.value {
        Some(question) => Ok(with_read_source(Json(question).into_response(), source)),
        None if source == ReadSource::Fallback => Err(ApiError::store_unavailable()),
        None => Err(ApiError::not_found("Question not found")),
    }
}

pub async fn create_question(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<QuestionCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require(&principal, Role::Member)?;

    let question = state
        .questions
        .create(&payload.title, &payload.content, principal.user_id)
        .await
        .map_err(question_to_api)?;

    info!(
        target: TARGET,
        question_id = question.question.id,
        user_id = %principal.user_id,
        "Question created"
    );
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn create_answer(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuestionId>,
    Json(payload): Json<AnswerCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require(&principal, Role::Member)?;

    let answer = state
        .questions
        .add_answer(id, &payload.content, principal.user_id)
        .await
        .map_err(question_to_api)?;

    info!(
        target: TARGET,
        question_id = id,
        answer_id = answer.id,
        user_id = %principal.user_id,
        "Answer created"
    );
    Ok((StatusCode::CREATED, Json(answer)))
}

pub async fn update_question(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuestionId>,
    Json(payload): Json<QuestionUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require(&principal, Role::Member)?;

    let question = state
        .questions
        .update(id, &payload.title, &payload.content)
        .await
        .map_err(question_to_api)?;
    Ok(Json(question))
}

pub async fn delete_question(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuestionId>,
) -> Result<impl IntoResponse, ApiError> {
    require(&principal, Role::Member)?;

    let deleted = state.questions.delete(id).await.map_err(question_to_api)?;
    if !deleted {
        return Err(ApiError::not_found("Question not found"));
    }

    info!(target: TARGET, question_id = id, user_id = %principal.user_id, "Question deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// -------- Assistant (manager) --------
pub async fn summarize(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<SummaryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require(&principal, Role::Manager)?;

    let summary = state.assistant.summarize(&payload).await;
    Ok(Json(SummaryResponse { summary }))
}

pub async fn ask(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require(&principal, Role::Manager)?;

    if payload.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty", None));
    }

    Ok(Json(state.assistant.ask(&payload.query).await))
}

pub async fn analyze(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require(&principal, Role::Manager)?;

    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let statistics = state.knowledge.analyze(category).await;

    Ok(Json(AnalysisResponse {
        insights: insights(&statistics),
        popular_categories: statistics.popular_categories.clone(),
        statistics,
        generated_at: state.clock.now(),
    }))
}

pub async fn categories(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    require(&principal, Role::Manager)?;

    Ok(Json(state.knowledge.extract_categories().await))
}
