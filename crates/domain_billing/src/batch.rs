//! Provider payment batches
//!
//! Approved claims are gathered by period into a batch, one line per claim.
//! A batch is approved by a second officer and then marked paid once the bank
//! transfer reference is known.
//!
//! ```text
//! Draft -> Approved -> Paid
//!   |         |
//!   +---------+--> Cancelled
//! ```

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use core_kernel::{ClaimId, Currency, DateRange, Money, PaymentBatchId, ProviderId};
use domain_claims::Claim;
use crate::error::BillingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Draft,
    Approved,
    Paid,
    Cancelled,
}

impl BatchStatus {
    pub const ALL: [BatchStatus; 4] = [
        BatchStatus::Draft,
        BatchStatus::Approved,
        BatchStatus::Paid,
        BatchStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Draft => "draft",
            BatchStatus::Approved => "approved",
            BatchStatus::Paid => "paid",
            BatchStatus::Cancelled => "cancelled",
        }
    }

    fn can_transition_to(&self, target: BatchStatus) -> bool {
        use BatchStatus::*;
        matches!(
            (self, target),
            (Draft, Approved) | (Approved, Paid) | (Draft, Cancelled) | (Approved, Cancelled)
        )
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BatchStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| BillingError::InvalidStatusTransition {
                from: s.to_string(),
                to: "a known status".to_string(),
            })
    }
}

/// One claim in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub claim_id: ClaimId,
    pub provider_id: ProviderId,
    pub amount: Money,
}

/// Totals owed to one provider within a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub provider_id: ProviderId,
    pub claim_count: usize,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentBatch {
    pub id: PaymentBatchId,
    /// `PB-<yyyymm>-<4 digits>`
    pub batch_number: String,
    pub period: DateRange,
    pub currency: Currency,
    pub items: Vec<BatchItem>,
    pub status: BatchStatus,
    pub created_by: String,
    pub approved_by: Option<String>,
    pub paid_reference: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentBatch {
    /// Builds a draft batch from the payable claims whose encounter falls in `period`
    ///
    /// Claims that are not approved, already batched, or outside the period
    /// are skipped.
    pub fn from_claims(period: DateRange, claims: &[Claim], actor: &str) -> Result<Self, BillingError> {
        let payable: Vec<&Claim> = claims
            .iter()
            .filter(|c| c.is_payable() && period.contains(c.encounter_date))
            .collect();
        if payable.is_empty() {
            return Err(BillingError::NoPayableClaims {
                start: period.start.to_string(),
                end: period.end.to_string(),
            });
        }

        let currency = payable[0].currency;
        let mut items = Vec::with_capacity(payable.len());
        for claim in payable {
            let amount = claim
                .approved_amount
                .ok_or_else(|| domain_claims::ClaimError::NotApproved(claim.claim_number.clone()))?;
            if amount.currency() != currency {
                return Err(BillingError::Money(core_kernel::MoneyError::CurrencyMismatch(
                    currency.to_string(),
                    amount.currency().to_string(),
                )));
            }
            items.push(BatchItem {
                claim_id: claim.id,
                provider_id: claim.provider_id,
                amount,
            });
        }

        let now = Utc::now();
        let batch = Self {
            id: PaymentBatchId::new_v7(),
            batch_number: generate_batch_number(&period),
            period,
            currency,
            items,
            status: BatchStatus::Draft,
            created_by: actor.to_string(),
            approved_by: None,
            paid_reference: None,
            cancellation_reason: None,
            created_at: now,
            approved_at: None,
            paid_at: None,
            updated_at: now,
        };
        batch.total()?;
        Ok(batch)
    }

    pub fn total(&self) -> Result<Money, BillingError> {
        Ok(Money::sum(self.items.iter().map(|i| &i.amount), self.currency)?)
    }

    pub fn claim_ids(&self) -> Vec<ClaimId> {
        self.items.iter().map(|i| i.claim_id).collect()
    }

    /// Per-provider totals, ordered by provider
    pub fn provider_summaries(&self) -> Result<Vec<ProviderSummary>, BillingError> {
        let mut by_provider: BTreeMap<ProviderId, ProviderSummary> = BTreeMap::new();
        for item in &self.items {
            let summary = by_provider.entry(item.provider_id).or_insert_with(|| ProviderSummary {
                provider_id: item.provider_id,
                claim_count: 0,
                total: Money::zero(self.currency),
            });
            summary.claim_count += 1;
            summary.total = summary.total.checked_add(&item.amount)?;
        }
        Ok(by_provider.into_values().collect())
    }

    pub fn approve(&mut self, actor: &str) -> Result<(), BillingError> {
        self.ensure_transition(BatchStatus::Approved)?;
        if actor == self.created_by {
            return Err(BillingError::SelfApproval(self.batch_number.clone()));
        }
        let total = self.total()?;
        let now = Utc::now();
        self.status = BatchStatus::Approved;
        self.approved_by = Some(actor.to_string());
        self.approved_at = Some(now);
        self.updated_at = now;
        info!(batch = %self.batch_number, %total, approver = actor, "Payment batch approved");
        Ok(())
    }

    pub fn mark_paid(&mut self, reference: &str) -> Result<(), BillingError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(BillingError::MissingReference);
        }
        self.ensure_transition(BatchStatus::Paid)?;
        let now = Utc::now();
        self.status = BatchStatus::Paid;
        self.paid_reference = Some(reference.to_string());
        self.paid_at = Some(now);
        self.updated_at = now;
        info!(batch = %self.batch_number, reference, "Payment batch paid");
        Ok(())
    }

    pub fn cancel(&mut self, reason: &str) -> Result<(), BillingError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(BillingError::CancellationReasonRequired);
        }
        self.ensure_transition(BatchStatus::Cancelled)?;
        self.status = BatchStatus::Cancelled;
        self.cancellation_reason = Some(reason.to_string());
        self.updated_at = Utc::now();
        info!(batch = %self.batch_number, reason, "Payment batch cancelled");
        Ok(())
    }

    fn ensure_transition(&self, target: BatchStatus) -> Result<(), BillingError> {
        if !self.status.can_transition_to(target) {
            return Err(BillingError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }
}

fn generate_batch_number(period: &DateRange) -> String {
    let serial: u32 = rand::thread_rng().gen_range(0..10_000);
    format!(
        "PB-{:04}{:02}-{:04}",
        period.start.year(),
        period.start.month(),
        serial
    )
}
