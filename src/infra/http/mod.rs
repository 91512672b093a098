pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Router, middleware as axum_middleware};

use crate::application::error::ErrorReport;

/// Full application router: `/health` plus the authenticated question API.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state.clone())
        .merge(build_api_router(state))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

async fn health(State(state): State<ApiState>) -> Response {
    match state.knowledge.repository().health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
