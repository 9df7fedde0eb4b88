//! Payment batch handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::PaymentBatchId;

use crate::auth::{permissions, require, TokenClaims};
use crate::dto::billing::*;
use crate::{error::ApiError, AppState};

pub async fn list_batches(
    State(state): State<AppState>,
    Query(params): Query<BatchListParams>,
) -> Result<Json<Vec<BatchResponse>>, ApiError> {
    let batches = state.ports.batches.list_batches(params.status, None).await?;
    let batches = batches
        .into_iter()
        .map(BatchResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(batches))
}

/// Batches every approved, unbatched claim with an encounter in the period
pub async fn create_batch(
    State(state): State<AppState>,
    user: TokenClaims,
    Json(request): Json<CreateBatchRequest>,
) -> Result<(StatusCode, Json<BatchResponse>), ApiError> {
    require(&user, permissions::BILLING_WRITE)?;
    let batch = state.billing.create_batch(request.period()?, &user.sub).await?;
    Ok((StatusCode::CREATED, Json(BatchResponse::try_from(batch)?)))
}

pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchResponse>, ApiError> {
    let batch = state
        .ports
        .batches
        .get_batch(PaymentBatchId::from(id), None)
        .await?;
    Ok(Json(BatchResponse::try_from(batch)?))
}

/// Approval must come from someone other than the batch creator
pub async fn approve_batch(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchResponse>, ApiError> {
    require(&user, permissions::BILLING_WRITE)?;
    let batch = state
        .billing
        .approve_batch(PaymentBatchId::from(id), &user.sub)
        .await?;
    Ok(Json(BatchResponse::try_from(batch)?))
}

pub async fn pay_batch(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
    Json(request): Json<PayBatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    require(&user, permissions::BILLING_WRITE)?;
    request.validate()?;
    let batch = state
        .billing
        .mark_paid(PaymentBatchId::from(id), &request.reference, &user.sub)
        .await?;
    Ok(Json(BatchResponse::try_from(batch)?))
}

pub async fn cancel_batch(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelBatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    require(&user, permissions::BILLING_WRITE)?;
    request.validate()?;
    let batch = state
        .billing
        .cancel_batch(PaymentBatchId::from(id), &request.reason, &user.sub)
        .await?;
    Ok(Json(BatchResponse::try_from(batch)?))
}
