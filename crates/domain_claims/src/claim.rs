//! Claim aggregate

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use core_kernel::{ClaimId, Currency, EnrolleeId, Money, PaymentBatchId, ProviderId, TreatmentLineId};
use domain_enrollment::PlanTier;
use crate::authorization::PaCode;
use crate::benefits::{BenefitCheck, BenefitSchedule};
use crate::error::ClaimError;
use crate::icd10::validate_icd10;
use crate::treatment::{NewTreatment, TreatmentLine};
use crate::vetting::{StageChange, VettingStage};

/// A claim as submitted by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClaim {
    pub enrollee_id: EnrolleeId,
    pub provider_id: ProviderId,
    /// Plan the enrollee was on at the encounter
    pub plan_tier: PlanTier,
    pub pa_code: Option<PaCode>,
    pub diagnosis_codes: Vec<String>,
    pub encounter_date: NaiveDate,
    pub treatments: Vec<NewTreatment>,
}

/// Amount a doctor approves for one line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineApproval {
    pub line_id: TreatmentLineId,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    /// `CLM-<year>-<7 digits>`
    pub claim_number: String,
    pub pa_code: Option<PaCode>,
    pub enrollee_id: EnrolleeId,
    pub provider_id: ProviderId,
    pub plan_tier: PlanTier,
    pub diagnosis_codes: Vec<String>,
    pub encounter_date: NaiveDate,
    pub currency: Currency,
    pub treatments: Vec<TreatmentLine>,
    pub stage: VettingStage,
    pub history: Vec<StageChange>,
    pub approved_amount: Option<Money>,
    pub rejection_reason: Option<String>,
    /// Vetter or doctor currently holding the claim
    pub assigned_to: Option<String>,
    pub batch_id: Option<PaymentBatchId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Creates a claim ready for initial vetting
    ///
    /// Diagnosis codes are validated and normalised; every line must be priced
    /// in the same currency.
    pub fn new(data: NewClaim) -> Result<Self, ClaimError> {
        if data.treatments.is_empty() {
            return Err(ClaimError::NoTreatments);
        }
        if data.diagnosis_codes.is_empty() {
            return Err(ClaimError::MalformedDiagnosis("no diagnosis supplied".to_string()));
        }
        let diagnosis_codes = data
            .diagnosis_codes
            .iter()
            .map(|code| validate_icd10(code))
            .collect::<Result<Vec<_>, _>>()?;

        let currency = data.treatments[0].unit_price.currency();
        let treatments = data
            .treatments
            .into_iter()
            .map(|t| {
                if t.unit_price.currency() != currency {
                    return Err(ClaimError::invalid_treatment(format!(
                        "line priced in {} on a {} claim",
                        t.unit_price.currency(),
                        currency
                    )));
                }
                TreatmentLine::new(t)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        let claim = Self {
            id: ClaimId::new_v7(),
            claim_number: generate_claim_number(data.encounter_date.year()),
            pa_code: data.pa_code,
            enrollee_id: data.enrollee_id,
            provider_id: data.provider_id,
            plan_tier: data.plan_tier,
            diagnosis_codes,
            encounter_date: data.encounter_date,
            currency,
            treatments,
            stage: VettingStage::ReadyForInitialVetting,
            history: Vec::new(),
            approved_amount: None,
            rejection_reason: None,
            assigned_to: None,
            batch_id: None,
            created_at: now,
            updated_at: now,
        };
        claim.submitted_amount()?;
        Ok(claim)
    }

    /// Sum of line totals
    pub fn submitted_amount(&self) -> Result<Money, ClaimError> {
        let totals: Vec<Money> = self.treatments.iter().map(|t| t.total()).collect();
        Ok(Money::sum(totals.iter(), self.currency)?)
    }

    pub fn treatment(&self, line_id: TreatmentLineId) -> Option<&TreatmentLine> {
        self.treatments.iter().find(|t| t.id == line_id)
    }

    pub fn add_treatment(&mut self, actor: &str, data: NewTreatment) -> Result<TreatmentLineId, ClaimError> {
        let currency = self.currency;
        self.edit_lines(actor, |lines| {
            if data.unit_price.currency() != currency {
                return Err(ClaimError::invalid_treatment(format!(
                    "line priced in {} on a {} claim",
                    data.unit_price.currency(),
                    currency
                )));
            }
            let line = TreatmentLine::new(data)?;
            let id = line.id;
            lines.push(line);
            Ok(id)
        })
    }

    pub fn remove_treatment(&mut self, actor: &str, line_id: TreatmentLineId) -> Result<TreatmentLine, ClaimError> {
        self.edit_lines(actor, |lines| {
            let index = lines
                .iter()
                .position(|t| t.id == line_id)
                .ok_or_else(|| ClaimError::TreatmentNotFound(line_id.to_string()))?;
            if lines.len() == 1 {
                return Err(ClaimError::NoTreatments);
            }
            Ok(lines.remove(index))
        })
    }

    pub fn update_treatment_quantity(
        &mut self,
        actor: &str,
        line_id: TreatmentLineId,
        quantity: u32,
    ) -> Result<(), ClaimError> {
        self.edit_lines(actor, |lines| line_mut(lines, line_id)?.set_quantity(quantity))
    }

    pub fn update_treatment_price(
        &mut self,
        actor: &str,
        line_id: TreatmentLineId,
        unit_price: Decimal,
    ) -> Result<(), ClaimError> {
        self.edit_lines(actor, |lines| line_mut(lines, line_id)?.set_unit_price(unit_price))
    }

    /// Flags every line against the schedule for this claim's plan
    pub fn apply_benefit_schedule(&mut self, schedule: &BenefitSchedule) -> Vec<BenefitCheck> {
        let checks: Vec<BenefitCheck> = self
            .treatments
            .iter()
            .map(|line| schedule.check_line(self.plan_tier, line))
            .collect();
        for (line, check) in self.treatments.iter_mut().zip(&checks) {
            line.exceeds_benefit_limit = check.exceeds;
        }
        let flagged = checks.iter().filter(|c| c.exceeds).count();
        if flagged > 0 {
            debug!(claim = %self.claim_number, flagged, "Lines over benefit limit");
        }
        checks
    }

    pub fn flagged_lines(&self) -> Vec<&TreatmentLine> {
        self.treatments.iter().filter(|t| t.exceeds_benefit_limit).collect()
    }

    pub fn pick_for_initial_vetting(&mut self, actor: &str) -> Result<(), ClaimError> {
        self.transition(VettingStage::UnderInitialVetting, actor, None)?;
        self.assigned_to = Some(actor.to_string());
        Ok(())
    }

    pub fn forward_to_doctor(&mut self, actor: &str, note: Option<String>) -> Result<(), ClaimError> {
        self.ensure_holder(actor)?;
        self.transition(VettingStage::PendingDoctorReview, actor, note)?;
        self.assigned_to = None;
        Ok(())
    }

    pub fn pick_for_doctor_review(&mut self, actor: &str) -> Result<(), ClaimError> {
        self.transition(VettingStage::UnderDoctorReview, actor, None)?;
        self.assigned_to = Some(actor.to_string());
        Ok(())
    }

    /// Puts a held claim back in the queue it was picked from
    pub fn release(&mut self, actor: &str) -> Result<(), ClaimError> {
        let target = match self.stage {
            VettingStage::UnderInitialVetting => VettingStage::ReadyForInitialVetting,
            VettingStage::UnderDoctorReview => VettingStage::PendingDoctorReview,
            other => {
                return Err(ClaimError::InvalidStageTransition {
                    from: other.to_string(),
                    to: "released".to_string(),
                })
            }
        };
        self.ensure_holder(actor)?;
        self.transition(target, actor, None)?;
        self.assigned_to = None;
        Ok(())
    }

    /// Approves the claim
    ///
    /// Lines without an entry in `line_approvals` are approved at their
    /// total. Each approved amount is capped at its line total. Benefit flags
    /// do not prevent approval.
    pub fn approve(&mut self, actor: &str, line_approvals: &[LineApproval]) -> Result<Money, ClaimError> {
        self.ensure_holder(actor)?;
        let submitted = self.submitted_amount()?;
        if !self.stage.can_transition_to(VettingStage::Approved) {
            return Err(ClaimError::InvalidStageTransition {
                from: self.stage.to_string(),
                to: VettingStage::Approved.to_string(),
            });
        }
        for approval in line_approvals {
            if self.treatment(approval.line_id).is_none() {
                return Err(ClaimError::TreatmentNotFound(approval.line_id.to_string()));
            }
            if approval.amount.is_sign_negative() {
                return Err(ClaimError::InvalidApproval(format!(
                    "negative amount for line {}",
                    approval.line_id
                )));
            }
        }

        let currency = self.currency;
        let mut approved_total = Money::zero(currency);
        for line in self.treatments.iter_mut() {
            let requested = line_approvals
                .iter()
                .find(|a| a.line_id == line.id)
                .map(|a| Money::new(a.amount, currency))
                .unwrap_or_else(|| line.total());
            let approved = requested.min(&line.total())?;
            approved_total = approved_total.checked_add(&approved)?;
            line.approved_amount = Some(approved);
        }

        self.transition(VettingStage::Approved, actor, None)?;
        self.approved_amount = Some(approved_total);
        self.assigned_to = None;
        info!(
            claim = %self.claim_number,
            %submitted,
            approved = %approved_total,
            "Claim approved"
        );
        Ok(approved_total)
    }

    pub fn reject(&mut self, actor: &str, reason: &str) -> Result<(), ClaimError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ClaimError::RejectionReasonRequired);
        }
        self.ensure_holder(actor)?;
        self.transition(VettingStage::Rejected, actor, Some(reason.to_string()))?;
        self.rejection_reason = Some(reason.to_string());
        self.assigned_to = None;
        info!(claim = %self.claim_number, reason, "Claim rejected");
        Ok(())
    }

    /// Approved claims not yet in a payment batch
    pub fn is_payable(&self) -> bool {
        self.stage == VettingStage::Approved && self.batch_id.is_none()
    }

    pub fn assign_to_batch(&mut self, batch_id: PaymentBatchId) -> Result<(), ClaimError> {
        if self.stage != VettingStage::Approved {
            return Err(ClaimError::NotApproved(self.claim_number.clone()));
        }
        if self.batch_id.is_some() {
            return Err(ClaimError::AlreadyBatched(self.claim_number.clone()));
        }
        self.batch_id = Some(batch_id);
        self.touch();
        Ok(())
    }

    /// Returns the claim to the unbatched pool when its batch is cancelled
    pub fn clear_batch(&mut self, batch_id: PaymentBatchId) {
        if self.batch_id == Some(batch_id) {
            self.batch_id = None;
            self.touch();
        }
    }

    /// Applies a change to the treatment lines on behalf of `actor`
    ///
    /// Only the holder may edit a picked claim. The lines are restored if the
    /// change fails or the new claim total overflows.
    fn edit_lines<T, F>(&mut self, actor: &str, change: F) -> Result<T, ClaimError>
    where
        F: FnOnce(&mut Vec<TreatmentLine>) -> Result<T, ClaimError>,
    {
        self.ensure_holder(actor)?;
        self.ensure_editable()?;
        let before = self.treatments.clone();
        let outcome = change(&mut self.treatments);
        let outcome = outcome.and_then(|value| self.submitted_amount().map(|_| value));
        match outcome {
            Ok(value) => {
                self.touch();
                Ok(value)
            }
            Err(err) => {
                self.treatments = before;
                Err(err)
            }
        }
    }

    fn ensure_editable(&self) -> Result<(), ClaimError> {
        if !self.stage.allows_treatment_edits() {
            return Err(ClaimError::ClaimLocked(self.stage.to_string()));
        }
        Ok(())
    }

    fn ensure_holder(&self, actor: &str) -> Result<(), ClaimError> {
        match &self.assigned_to {
            Some(holder) if holder != actor => Err(ClaimError::NotAssignee {
                assigned_to: holder.clone(),
                actor: actor.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn transition(&mut self, target: VettingStage, actor: &str, note: Option<String>) -> Result<(), ClaimError> {
        if !self.stage.can_transition_to(target) {
            return Err(ClaimError::InvalidStageTransition {
                from: self.stage.to_string(),
                to: target.to_string(),
            });
        }
        let now = Utc::now();
        self.history.push(StageChange {
            from: self.stage,
            to: target,
            actor: actor.to_string(),
            note,
            at: now,
        });
        debug!(claim = %self.claim_number, from = %self.stage, to = %target, actor, "Vetting stage change");
        self.stage = target;
        self.updated_at = now;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn line_mut(lines: &mut [TreatmentLine], line_id: TreatmentLineId) -> Result<&mut TreatmentLine, ClaimError> {
    lines
        .iter_mut()
        .find(|t| t.id == line_id)
        .ok_or_else(|| ClaimError::TreatmentNotFound(line_id.to_string()))
}

fn generate_claim_number(year: i32) -> String {
    let serial: u32 = rand::thread_rng().gen_range(0..10_000_000);
    format!("CLM-{}-{:07}", year, serial)
}
