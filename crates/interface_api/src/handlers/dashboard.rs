//! Operational dashboard

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;

use domain_billing::BatchStatus;
use domain_claims::{ClaimQuery, VettingStage};
use domain_enrollment::{EnrolleeQuery, EnrolleeStatus};

use crate::{error::ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub enrollees_by_status: BTreeMap<&'static str, usize>,
    pub claims_by_stage: BTreeMap<&'static str, usize>,
    /// Approved claims not yet in a payment batch
    pub payable_claims: usize,
    pub pending_batches: usize,
    /// Sum of draft and approved batches
    pub pending_batch_total: Decimal,
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let enrollees = state
        .ports
        .enrollees
        .find_enrollees(EnrolleeQuery::default(), None)
        .await?;
    let mut enrollees_by_status: BTreeMap<&'static str, usize> =
        [EnrolleeStatus::Active, EnrolleeStatus::Suspended, EnrolleeStatus::Terminated]
            .iter()
            .map(|s| (s.as_str(), 0))
            .collect();
    for enrollee in &enrollees {
        *enrollees_by_status.entry(enrollee.status.as_str()).or_insert(0) += 1;
    }

    let claims = state.ports.claims.find_claims(ClaimQuery::default(), None).await?;
    let mut claims_by_stage: BTreeMap<&'static str, usize> =
        VettingStage::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for claim in &claims {
        *claims_by_stage.entry(claim.stage.as_str()).or_insert(0) += 1;
    }
    let payable_claims = claims.iter().filter(|c| c.is_payable()).count();

    let mut pending_batches = 0;
    for status in [BatchStatus::Draft, BatchStatus::Approved] {
        pending_batches += state.ports.batches.list_batches(Some(status), None).await?.len();
    }
    let pending_batch_total = state.billing.outstanding_total().await?;

    Ok(Json(DashboardResponse {
        enrollees_by_status,
        claims_by_stage,
        payable_claims,
        pending_batches,
        pending_batch_total,
    }))
}
