//! API middleware

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::{validate_token, AuthError, TokenClaims};
use crate::error::ApiError;
use crate::AppState;

/// Authentication middleware
///
/// Validates the bearer token and stores its [`TokenClaims`] in the request
/// extensions for handlers to pick up.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        warn!(uri = %request.uri(), "Missing or invalid Authorization header");
        return ApiError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    match validate_token(token, &state.config.jwt_secret) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            warn!(error = %e, "Token validation failed");
            ApiError::from(e).into_response()
        }
    }
}

/// Audit logging middleware
///
/// One line per API request with the caller, outcome and latency.
pub async fn audit_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request
        .extensions()
        .get::<TokenClaims>()
        .map(|c| c.sub.clone())
        .unwrap_or_else(|| "anonymous".to_string());
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        user = %user_id,
        request_id = %request_id,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}

/// Reads the authenticated caller from the request extensions
///
/// Handlers take this as an extractor; it is only present behind
/// [`auth_middleware`].
#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for TokenClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken.into())
    }
}
