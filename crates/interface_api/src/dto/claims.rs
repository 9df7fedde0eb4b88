//! Claims and prior authorization DTOs

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Currency, EnrolleeId, Money, ProviderId, TreatmentLineId};
use domain_claims::{
    AuthorizationStatus, Claim, ClaimError, ClaimQuery, LineApproval, NewClaim, NewTreatment,
    PaCode, PriorAuthorization, ServiceType, StageChange, TreatmentLine, VettingStage,
};
use domain_enrollment::PlanTier;

use super::page_limit;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct TreatmentRequest {
    pub service_type: ServiceType,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl TreatmentRequest {
    pub fn into_new_treatment(self, currency: Currency) -> NewTreatment {
        NewTreatment {
            service_type: self.service_type,
            description: self.description,
            quantity: self.quantity,
            unit_price: Money::new(self.unit_price, currency),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitClaimRequest {
    pub enrollee_id: Uuid,
    pub provider_id: Uuid,
    pub pa_code: Option<String>,
    pub diagnosis_codes: Vec<String>,
    pub encounter_date: NaiveDate,
    /// ISO code of the currency every line is priced in; defaults to NGN
    pub currency: Option<String>,
    pub treatments: Vec<TreatmentRequest>,
}

impl TryFrom<SubmitClaimRequest> for NewClaim {
    type Error = ClaimError;

    fn try_from(request: SubmitClaimRequest) -> Result<Self, Self::Error> {
        let currency = match request.currency {
            Some(ref code) => Currency::from_str(code)?,
            None => Currency::NGN,
        };
        let pa_code = request
            .pa_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .map(PaCode::parse)
            .transpose()?;

        Ok(NewClaim {
            enrollee_id: EnrolleeId::from(request.enrollee_id),
            provider_id: ProviderId::from(request.provider_id),
            // Replaced with the member's current plan on submission
            plan_tier: PlanTier::default(),
            pa_code,
            diagnosis_codes: request.diagnosis_codes,
            encounter_date: request.encounter_date,
            treatments: request
                .treatments
                .into_iter()
                .map(|t| t.into_new_treatment(currency))
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTreatmentRequest {
    pub quantity: Option<u32>,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForwardRequest {
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LineApprovalRequest {
    pub line_id: Uuid,
    pub amount: Decimal,
}

/// Lines left out are approved at their full total
#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub lines: Vec<LineApprovalRequest>,
}

impl ApproveRequest {
    pub fn line_approvals(&self) -> Vec<LineApproval> {
        self.lines
            .iter()
            .map(|l| LineApproval {
                line_id: TreatmentLineId::from(l.line_id),
                amount: l.amount,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectRequest {
    #[validate(length(min = 1, max = 1000, message = "a rejection reason is required"))]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClaimListParams {
    pub stage: Option<VettingStage>,
    pub provider_id: Option<Uuid>,
    pub enrollee_id: Option<Uuid>,
    /// Only approved claims not yet in a payment batch
    #[serde(default)]
    pub unbatched: bool,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<ClaimListParams> for ClaimQuery {
    fn from(params: ClaimListParams) -> Self {
        ClaimQuery {
            stage: params.stage,
            provider_id: params.provider_id.map(ProviderId::from),
            enrollee_id: params.enrollee_id.map(EnrolleeId::from),
            unbatched_only: params.unbatched,
            limit: Some(page_limit(params.limit)),
            offset: params.offset,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TreatmentResponse {
    pub id: Uuid,
    pub service_type: ServiceType,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub approved_amount: Option<Decimal>,
    pub exceeds_benefit_limit: bool,
}

impl From<&TreatmentLine> for TreatmentResponse {
    fn from(line: &TreatmentLine) -> Self {
        Self {
            id: line.id.into(),
            service_type: line.service_type,
            description: line.description.clone(),
            quantity: line.quantity(),
            unit_price: line.unit_price().amount(),
            total: line.total().amount(),
            approved_amount: line.approved_amount.map(|m| m.amount()),
            exceeds_benefit_limit: line.exceeds_benefit_limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: Uuid,
    pub claim_number: String,
    pub pa_code: Option<String>,
    pub enrollee_id: Uuid,
    pub provider_id: Uuid,
    pub plan_tier: PlanTier,
    pub diagnosis_codes: Vec<String>,
    pub encounter_date: NaiveDate,
    pub currency: String,
    pub submitted_amount: Decimal,
    pub approved_amount: Option<Decimal>,
    pub stage: VettingStage,
    pub assigned_to: Option<String>,
    pub rejection_reason: Option<String>,
    pub batch_id: Option<Uuid>,
    pub flagged_lines: usize,
    pub treatments: Vec<TreatmentResponse>,
    pub history: Vec<StageChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Claim> for ClaimResponse {
    type Error = ApiError;

    fn try_from(claim: Claim) -> Result<Self, Self::Error> {
        Ok(Self {
            id: claim.id.into(),
            submitted_amount: claim.submitted_amount()?.amount(),
            flagged_lines: claim.flagged_lines().len(),
            treatments: claim.treatments.iter().map(TreatmentResponse::from).collect(),
            claim_number: claim.claim_number,
            pa_code: claim.pa_code.map(|c| c.as_str().to_string()),
            enrollee_id: claim.enrollee_id.into(),
            provider_id: claim.provider_id.into(),
            plan_tier: claim.plan_tier,
            diagnosis_codes: claim.diagnosis_codes,
            encounter_date: claim.encounter_date,
            currency: claim.currency.code().to_string(),
            approved_amount: claim.approved_amount.map(|m| m.amount()),
            stage: claim.stage,
            assigned_to: claim.assigned_to,
            rejection_reason: claim.rejection_reason,
            batch_id: claim.batch_id.map(Uuid::from),
            history: claim.history,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorizationResponse {
    pub id: Uuid,
    pub code: String,
    pub enrollee_id: Uuid,
    pub provider_id: Uuid,
    pub diagnosis_code: String,
    pub services: Vec<ServiceType>,
    /// Status as of the time of the response; expiry is computed, not stored
    pub status: AuthorizationStatus,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub issued_by: String,
    pub used_at: Option<DateTime<Utc>>,
}

impl From<PriorAuthorization> for AuthorizationResponse {
    fn from(pa: PriorAuthorization) -> Self {
        Self {
            id: pa.id.into(),
            status: pa.status_at(Utc::now()),
            code: pa.code.as_str().to_string(),
            enrollee_id: pa.enrollee_id.into(),
            provider_id: pa.provider_id.into(),
            diagnosis_code: pa.diagnosis_code,
            services: pa.services,
            issued_at: pa.issued_at,
            expires_at: pa.expires_at,
            issued_by: pa.issued_by,
            used_at: pa.used_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> SubmitClaimRequest {
        SubmitClaimRequest {
            enrollee_id: Uuid::now_v7(),
            provider_id: Uuid::now_v7(),
            pa_code: Some("  ".to_string()),
            diagnosis_codes: vec!["B54".to_string()],
            encounter_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            currency: None,
            treatments: vec![TreatmentRequest {
                service_type: ServiceType::Pharmacy,
                description: "Artemether/lumefantrine".to_string(),
                quantity: 2,
                unit_price: dec!(2500),
            }],
        }
    }

    #[test]
    fn test_blank_pa_code_is_ignored_and_currency_defaults() {
        let claim = NewClaim::try_from(request()).unwrap();
        assert!(claim.pa_code.is_none());
        assert_eq!(claim.treatments[0].unit_price, Money::ngn(dec!(2500)));
    }

    #[test]
    fn test_malformed_pa_code_rejected() {
        let mut bad = request();
        bad.pa_code = Some("PA-1".to_string());
        assert!(NewClaim::try_from(bad).is_err());
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let mut bad = request();
        bad.currency = Some("XYZ".to_string());
        assert!(NewClaim::try_from(bad).is_err());
    }
}
