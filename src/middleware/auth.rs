use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::handlers::ApiError;
use crate::services::AppState;

/// Pull the token out of an `Authorization: Bearer ...` header.
pub fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Reject requests without a valid bearer token; otherwise attach the
/// caller's `Identity` as a request extension.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("No token, authorization denied".to_string()))?;

    let identity = state
        .credentials
        .verify_token(token)
        .map_err(|_| ApiError::Unauthorized("Token is not valid".to_string()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
