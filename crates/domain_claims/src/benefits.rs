//! Benefit limits per plan tier and service
//!
//! The schedule caps what a single treatment line may cost for each
//! (plan, service) pair. A line over its limit, or for a service the plan has
//! no limit for, is flagged for the doctor reviewing the claim. Flags inform
//! the review; they never block approval.
//!
//! Schedules can be loaded from JSON so the medical director can revise
//! limits without a release:
//!
//! ```json
//! {
//!   "currency": "NGN",
//!   "limits": [
//!     { "plan": "gold", "service": "dental", "limit": "80000" }
//!   ]
//! }
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use core_kernel::{Currency, Money, TreatmentLineId};
use domain_enrollment::{PlanTier, ServiceType};
use crate::error::ClaimError;
use crate::treatment::TreatmentLine;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScheduleDocument {
    #[serde(default)]
    currency: Currency,
    limits: Vec<LimitEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LimitEntry {
    plan: PlanTier,
    service: ServiceType,
    limit: Decimal,
}

/// Result of checking one line against the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitCheck {
    pub line_id: TreatmentLineId,
    pub service: ServiceType,
    pub total: Money,
    /// `None` when the plan has no limit for the service
    pub limit: Option<Money>,
    pub exceeds: bool,
}

/// Per-line limits keyed by plan tier and service
#[derive(Debug, Clone, PartialEq)]
pub struct BenefitSchedule {
    currency: Currency,
    limits: HashMap<(PlanTier, ServiceType), Money>,
}

impl Default for BenefitSchedule {
    /// The standard schedule: a base naira limit per service scaled by tier,
    /// for every service the tier covers
    fn default() -> Self {
        let base = |service: ServiceType| -> Decimal {
            match service {
                ServiceType::Consultation => dec!(10000),
                ServiceType::Laboratory => dec!(20000),
                ServiceType::Radiology => dec!(35000),
                ServiceType::Pharmacy => dec!(15000),
                ServiceType::Surgery => dec!(250000),
                ServiceType::Maternity => dec!(150000),
                ServiceType::Dental => dec!(40000),
                ServiceType::Optical => dec!(30000),
                ServiceType::Physiotherapy => dec!(25000),
                ServiceType::Admission => dec!(100000),
            }
        };
        let factor = |plan: PlanTier| -> Decimal {
            match plan {
                PlanTier::Bronze => dec!(1),
                PlanTier::Silver => dec!(1.5),
                PlanTier::Gold => dec!(2),
                PlanTier::Platinum => dec!(3),
            }
        };

        let mut limits = HashMap::new();
        for plan in PlanTier::ALL {
            for service in ServiceType::ALL {
                if plan.covers(service) {
                    limits.insert((plan, service), Money::ngn(base(service) * factor(plan)));
                }
            }
        }
        Self {
            currency: Currency::NGN,
            limits,
        }
    }
}

impl BenefitSchedule {
    /// An empty schedule: every line is flagged
    pub fn empty(currency: Currency) -> Self {
        Self {
            currency,
            limits: HashMap::new(),
        }
    }

    pub fn with_limit(mut self, plan: PlanTier, service: ServiceType, limit: Decimal) -> Self {
        self.limits.insert((plan, service), Money::new(limit, self.currency));
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ClaimError> {
        let doc: ScheduleDocument = serde_json::from_str(json)
            .map_err(|e| ClaimError::InvalidBenefitSchedule(e.to_string()))?;

        let mut schedule = Self::empty(doc.currency);
        for entry in doc.limits {
            if entry.limit.is_sign_negative() {
                return Err(ClaimError::InvalidBenefitSchedule(format!(
                    "negative limit for {} {}",
                    entry.plan, entry.service
                )));
            }
            if schedule.limits.contains_key(&(entry.plan, entry.service)) {
                return Err(ClaimError::InvalidBenefitSchedule(format!(
                    "duplicate limit for {} {}",
                    entry.plan, entry.service
                )));
            }
            schedule = schedule.with_limit(entry.plan, entry.service, entry.limit);
        }
        Ok(schedule)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClaimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ClaimError::InvalidBenefitSchedule(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Serialises the schedule in the format accepted by [`from_json`](Self::from_json)
    pub fn to_json(&self) -> Result<String, ClaimError> {
        let mut limits: Vec<LimitEntry> = self
            .limits
            .iter()
            .map(|((plan, service), limit)| LimitEntry {
                plan: *plan,
                service: *service,
                limit: limit.amount(),
            })
            .collect();
        limits.sort_by_key(|e| (e.plan, e.service));
        serde_json::to_string_pretty(&ScheduleDocument {
            currency: self.currency,
            limits,
        })
        .map_err(|e| ClaimError::Internal(e.to_string()))
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn limit_for(&self, plan: PlanTier, service: ServiceType) -> Option<Money> {
        self.limits.get(&(plan, service)).copied()
    }

    /// Compares a line total with the limit; strictly greater is over
    pub fn check_line(&self, plan: PlanTier, line: &TreatmentLine) -> BenefitCheck {
        let limit = self.limit_for(plan, line.service_type);
        let total = line.total();
        let exceeds = match limit {
            Some(limit) if limit.currency() == total.currency() => total.amount() > limit.amount(),
            // A limit in another currency cannot vouch for the line
            Some(_) => true,
            None => true,
        };
        BenefitCheck {
            line_id: line.id,
            service: line.service_type,
            total,
            limit,
            exceeds,
        }
    }
}
