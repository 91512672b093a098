pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::middleware::log_responses;

/// Header naming where a read's value came from (`cache`, `store`, `fallback`, `skipped`).
pub const READ_SOURCE_HEADER: &str = "x-faqbase-read-source";

pub fn build_api_router(state: ApiState) -> Router {
    let auth_state = state.clone();

    Router::new()
        .route(
            "/api/questions",
            get(handlers::list_questions).post(handlers::create_question),
        )
        .route("/api/questions/summary", post(handlers::summarize))
        .route("/api/questions/ask", post(handlers::ask))
        .route("/api/questions/analyze", get(handlers::analyze))
        .route("/api/questions/categories", get(handlers::categories))
        .route(
            "/api/questions/{id}",
            get(handlers::get_question)
                .post(handlers::create_answer)
                .put(handlers::update_question)
                .delete(handlers::delete_question),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::api_auth,
        ))
        .layer(axum_middleware::from_fn(log_responses))
}
