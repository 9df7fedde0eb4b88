//! Enrollee handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use core_kernel::EnrolleeId;
use domain_enrollment::{EligibilityResult, UploadReport};

use crate::auth::{permissions, require, TokenClaims};
use crate::dto::enrollment::*;
use crate::{error::ApiError, AppState};

pub async fn list_enrollees(
    State(state): State<AppState>,
    Query(params): Query<EnrolleeListParams>,
) -> Result<Json<Vec<EnrolleeResponse>>, ApiError> {
    let enrollees = state.ports.enrollees.find_enrollees(params.into(), None).await?;
    Ok(Json(enrollees.into_iter().map(EnrolleeResponse::from).collect()))
}

/// Registers a single member
pub async fn register_enrollee(
    State(state): State<AppState>,
    user: TokenClaims,
    Json(request): Json<RegisterEnrolleeRequest>,
) -> Result<(StatusCode, Json<EnrolleeResponse>), ApiError> {
    require(&user, permissions::ENROLLMENT_WRITE)?;
    let today = Utc::now().date_naive();
    let enrollee = state
        .enrollment
        .register(request.into_new_enrollee(today), today, &user.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(enrollee.into())))
}

/// Registers members from a CSV sheet sent as the request body
///
/// Bad rows are reported back with their line numbers; good rows are stored.
pub async fn upload_enrollees(
    State(state): State<AppState>,
    user: TokenClaims,
    body: String,
) -> Result<Json<UploadReport>, ApiError> {
    require(&user, permissions::ENROLLMENT_WRITE)?;
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("the upload is empty".to_string()));
    }
    let report = state
        .enrollment
        .bulk_register(&body, Utc::now().date_naive(), &user.sub)
        .await?;
    Ok(Json(report))
}

pub async fn get_enrollee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EnrolleeResponse>, ApiError> {
    let enrollee = state
        .ports
        .enrollees
        .get_enrollee(EnrolleeId::from(id), None)
        .await?;
    Ok(Json(enrollee.into()))
}

pub async fn change_plan(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangePlanRequest>,
) -> Result<Json<EnrolleeResponse>, ApiError> {
    require(&user, permissions::ENROLLMENT_WRITE)?;
    let enrollee = state
        .enrollment
        .change_plan(EnrolleeId::from(id), request.plan, &user.sub)
        .await?;
    Ok(Json(enrollee.into()))
}

pub async fn set_status(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
    Json(request): Json<SetEnrolleeStatusRequest>,
) -> Result<Json<EnrolleeResponse>, ApiError> {
    require(&user, permissions::ENROLLMENT_WRITE)?;
    let enrollee = state
        .enrollment
        .set_status(EnrolleeId::from(id), request.status, &user.sub)
        .await?;
    Ok(Json(enrollee.into()))
}

/// `?service=surgery&date=2024-07-01`; the date defaults to today
pub async fn check_eligibility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<EligibilityParams>,
) -> Result<Json<EligibilityResult>, ApiError> {
    let on = params.date.unwrap_or_else(|| Utc::now().date_naive());
    let result = state
        .enrollment
        .check_eligibility(EnrolleeId::from(id), params.service, on)
        .await?;
    Ok(Json(result))
}
