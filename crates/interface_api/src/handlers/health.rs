//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub version: String,
    pub adapters: Vec<HealthCheckResult>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check across every port adapter
///
/// Answers 503 when any adapter reports itself unhealthy.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let ports = &state.ports;
    let adapters = vec![
        ports.enrollees.health_check().await,
        ports.providers.health_check().await,
        ports.claims.health_check().await,
        ports.batches.health_check().await,
    ];
    let ready = adapters.iter().all(|a| a.status != AdapterHealth::Unhealthy);

    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        tracing::warn!("Readiness check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };
    (
        status,
        Json(ReadinessResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            adapters,
        }),
    )
}
