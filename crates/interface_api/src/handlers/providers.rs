//! Provider network handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use core_kernel::{OperationMetadata, ProviderId};
use domain_provider::{NewProvider, Provider};

use crate::auth::{permissions, require, TokenClaims};
use crate::dto::providers::*;
use crate::{error::ApiError, AppState};

pub async fn list_providers(
    State(state): State<AppState>,
    Query(params): Query<ProviderListParams>,
) -> Result<Json<Vec<ProviderResponse>>, ApiError> {
    let providers = state.ports.providers.find_providers(params.into(), None).await?;
    Ok(Json(providers.into_iter().map(ProviderResponse::from).collect()))
}

/// Onboards a provider with an active contract
pub async fn create_provider(
    State(state): State<AppState>,
    user: TokenClaims,
    Json(request): Json<NewProvider>,
) -> Result<(StatusCode, Json<ProviderResponse>), ApiError> {
    require(&user, permissions::PROVIDER_WRITE)?;
    let provider = Provider::new(request)?;
    state
        .ports
        .providers
        .create_provider(&provider, Some(OperationMetadata::for_user(&user.sub)))
        .await?;
    info!(provider = %provider.provider_code, tier = %provider.tier, "Provider onboarded");
    Ok((StatusCode::CREATED, Json(provider.into())))
}

pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProviderResponse>, ApiError> {
    let provider = state
        .ports
        .providers
        .get_provider(ProviderId::from(id), None)
        .await?;
    Ok(Json(provider.into()))
}

pub async fn renew_contract(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
    Json(request): Json<RenewContractRequest>,
) -> Result<Json<ProviderResponse>, ApiError> {
    require(&user, permissions::PROVIDER_WRITE)?;
    let metadata = Some(OperationMetadata::for_user(&user.sub));
    let mut provider = state
        .ports
        .providers
        .get_provider(ProviderId::from(id), metadata.clone())
        .await?;
    provider.renew_contract(request.contract_end)?;
    state.ports.providers.update_provider(&provider, metadata).await?;
    Ok(Json(provider.into()))
}

pub async fn set_status(
    State(state): State<AppState>,
    user: TokenClaims,
    Path(id): Path<Uuid>,
    Json(request): Json<SetProviderStatusRequest>,
) -> Result<Json<ProviderResponse>, ApiError> {
    require(&user, permissions::PROVIDER_WRITE)?;
    let metadata = Some(OperationMetadata::for_user(&user.sub));
    let mut provider = state
        .ports
        .providers
        .get_provider(ProviderId::from(id), metadata.clone())
        .await?;
    provider.set_status(request.status)?;
    state.ports.providers.update_provider(&provider, metadata).await?;
    info!(provider = %provider.provider_code, status = %provider.status, user = %user.sub, "Provider status changed");
    Ok(Json(provider.into()))
}
