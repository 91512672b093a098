use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::access::AccessError;

use super::error::ApiError;
use super::state::ApiState;

pub async fn api_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_token(request.headers().get(axum::http::header::AUTHORIZATION));

    let principal = match state.access.authenticate(token.as_deref()) {
        Ok(principal) => principal,
        Err(AccessError::Missing) | Err(AccessError::Invalid) => {
            return ApiError::unauthorized().into_response();
        }
        Err(AccessError::Forbidden(_)) => return ApiError::forbidden().into_response(),
    };

    request.extensions_mut().insert(principal.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

fn extract_token(header: Option<&HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.to_string())
}
