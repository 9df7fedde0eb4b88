//! Authentication and authorization

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

/// JWT claims carried by every authenticated request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Roles and permissions granted to the user
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = TokenClaims {
        sub: user_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

pub fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, AuthError> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role; `admin` implies every permission
pub fn has_role(claims: &TokenClaims, required_role: &str) -> bool {
    claims
        .roles
        .iter()
        .any(|r| r == required_role || r == permissions::ADMIN)
}

pub fn require(claims: &TokenClaims, permission: &str) -> Result<(), AuthError> {
    if has_role(claims, permission) {
        Ok(())
    } else {
        warn!(user = %claims.sub, permission, "Permission denied");
        Err(AuthError::MissingPermission(permission.to_string()))
    }
}

/// Permission definitions
pub mod permissions {
    pub const ADMIN: &str = "admin";
    pub const ENROLLMENT_WRITE: &str = "enrollment:write";
    pub const PROVIDER_WRITE: &str = "provider:write";
    /// Issue PA codes and submit claims on behalf of a provider
    pub const CLAIM_SUBMIT: &str = "claim:submit";
    /// Initial vetting
    pub const CLAIM_VET: &str = "claim:vet";
    /// Doctor review
    pub const CLAIM_REVIEW: &str = "claim:review";
    pub const CLAIM_APPROVE: &str = "claim:approve";
    pub const BILLING_WRITE: &str = "billing:write";
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
    /// Roles to put in the token; defaults to `admin`
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Issues a development token for the configured credentials
pub async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let config = &state.config;
    if request.username != config.admin_username || request.password != config.admin_password {
        warn!(username = %request.username, "Rejected token request");
        return Err(AuthError::InvalidCredentials.into());
    }

    let roles = if request.roles.is_empty() {
        vec![permissions::ADMIN.to_string()]
    } else {
        request.roles
    };
    let access_token = create_token(
        &request.username,
        roles.clone(),
        &config.jwt_secret,
        config.jwt_expiration_secs,
    )?;
    info!(user = %request.username, roles = ?roles, "Token issued");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.jwt_expiration_secs,
    }))
}
