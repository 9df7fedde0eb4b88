//! Claims, vetting and prior authorization handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, TreatmentLineId};
use domain_claims::{NewAuthorization, NewClaim, PaCode, VettingStage};

use crate::auth::{permissions, require, TokenClaims};
use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

/// Issues a PA code for an upcoming encounter
pub async fn issue_authorization(
    State(state): State<AppState>,
    user: TokenClaims,
    Json(request): Json<NewAuthorization>,
) -> Result<(StatusCode, Json<AuthorizationResponse>), ApiError> {
    require(&user, permissions::CLAIM_SUBMIT)?;
    let authorization = state
        .claims
        .issue_authorization(request, &user.sub, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(authorization.into())))
}

pub async fn get_authorization(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<AuthorizationResponse>, ApiError> {
    let code = PaCode::parse(&code)?;
    let authorization = state.ports.claims.get_authorization_by_code(&code).await?;
    Ok(Json(authorization.into()))
}

pub async fn list_claims(
    State(state): State<AppState>,
    Query(params): Query<ClaimListParams>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = state.ports.claims.find_claims(params.into(), None).await?;
    let claims = claims
        .into_iter()
        .map(ClaimResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(claims))
}

pub async fn submit_claim(
    State(state): State<AppState>,
    user: TokenClaims,
    Json(request): Json<SubmitClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    require(&user, permissions::CLAIM_SUBMIT)?;
    let claim = state
        .claims
        .submit_claim(NewClaim::try_from(request)?, &user.sub, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(ClaimResponse::try_from(claim)?)))
}

pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.get_claim(ClaimId::from(id)).await?;
    Ok(Json(ClaimResponse::try_from(claim)?))
}

/// Vetters and reviewing doctors may both correct treatment lines
fn require_vetting_role(user: &TokenClaims) -> Result<(), ApiError> {
    require(user, permissions::CLAIM_VET).or_else(|_| require(user, permissions::CLAIM_REVIEW))?;
    Ok(())
}

pub async fn add_treatment(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
    Json(request): Json<TreatmentRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    require_vetting_role(&user)?;
    let id = ClaimId::from(id);
    let currency = state.claims.get_claim(id).await?.currency;
    let claim = state
        .claims
        .add_treatment(id, request.into_new_treatment(currency), &user.sub)
        .await?;
    Ok(Json(ClaimResponse::try_from(claim)?))
}

pub async fn update_treatment(
    State(state): State<AppState>,
    user: TokenClaims,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateTreatmentRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    require_vetting_role(&user)?;
    if request.quantity.is_none() && request.unit_price.is_none() {
        return Err(ApiError::validation("supply a quantity, a unit_price or both"));
    }
    let claim = state
        .claims
        .update_treatment(
            ClaimId::from(id),
            TreatmentLineId::from(line_id),
            request.quantity,
            request.unit_price,
            &user.sub,
        )
        .await?;
    Ok(Json(ClaimResponse::try_from(claim)?))
}

/// Picks the claim from the initial vetting or doctor review queue
///
/// Which permission is needed depends on the queue the claim is waiting in.
pub async fn pick(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = ClaimId::from(id);
    let current = state.claims.get_claim(id).await?;
    match current.stage {
        VettingStage::PendingDoctorReview => require(&user, permissions::CLAIM_REVIEW)?,
        _ => require(&user, permissions::CLAIM_VET)?,
    }
    let claim = state.claims.pick(id, &user.sub).await?;
    Ok(Json(ClaimResponse::try_from(claim)?))
}

pub async fn forward(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
    request: Option<Json<ForwardRequest>>,
) -> Result<Json<ClaimResponse>, ApiError> {
    require(&user, permissions::CLAIM_VET)?;
    let note = request
        .and_then(|Json(r)| r.note)
        .filter(|n| !n.trim().is_empty());
    let claim = state
        .claims
        .forward_to_doctor(ClaimId::from(id), note, &user.sub)
        .await?;
    Ok(Json(ClaimResponse::try_from(claim)?))
}

pub async fn release(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    require_vetting_role(&user)?;
    let claim = state.claims.release(ClaimId::from(id), &user.sub).await?;
    Ok(Json(ClaimResponse::try_from(claim)?))
}

/// Approves the claim, optionally with reduced amounts for some lines
pub async fn approve(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
    request: Option<Json<ApproveRequest>>,
) -> Result<Json<ClaimResponse>, ApiError> {
    require(&user, permissions::CLAIM_APPROVE)?;
    let approvals = request
        .map(|Json(r)| r.line_approvals())
        .unwrap_or_default();
    let claim = state
        .claims
        .approve(ClaimId::from(id), approvals, &user.sub)
        .await?;
    Ok(Json(ClaimResponse::try_from(claim)?))
}

pub async fn reject(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    require_vetting_role(&user)?;
    request.validate()?;
    let claim = state
        .claims
        .reject(ClaimId::from(id), &request.reason, &user.sub)
        .await?;
    Ok(Json(ClaimResponse::try_from(claim)?))
}
