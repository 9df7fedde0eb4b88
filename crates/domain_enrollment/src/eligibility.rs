//! Point-of-care eligibility checks
//!
//! A provider calls in before treating a member; the check answers whether
//! the member may receive a given service on a given day and, if not, why.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::EnrolleeId;
use crate::enrollee::{Enrollee, EnrolleeStatus};
use crate::plan::{PlanTier, ServiceType};

/// Why a member is not eligible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibilityReason {
    NotActive { status: EnrolleeStatus },
    PlanExcludesService { plan: PlanTier, service: ServiceType },
    WaitingPeriod { eligible_from: NaiveDate },
    NotYetEnrolled { enrolled_on: NaiveDate },
}

impl IneligibilityReason {
    pub fn describe(&self) -> String {
        match self {
            IneligibilityReason::NotActive { status } => {
                format!("membership is {}", status)
            }
            IneligibilityReason::PlanExcludesService { plan, service } => {
                format!("{} plan does not cover {}", plan, service)
            }
            IneligibilityReason::WaitingPeriod { eligible_from } => {
                format!("waiting period runs until {}", eligible_from)
            }
            IneligibilityReason::NotYetEnrolled { enrolled_on } => {
                format!("cover starts on {}", enrolled_on)
            }
        }
    }
}

/// Outcome of an eligibility check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub enrollee_id: EnrolleeId,
    pub service: ServiceType,
    pub checked_on: NaiveDate,
    pub plan: PlanTier,
    pub eligible: bool,
    pub reasons: Vec<IneligibilityReason>,
}

/// Checks whether `enrollee` may receive `service` on `on`
///
/// Every failing rule is reported, not just the first one.
pub fn check_eligibility(enrollee: &Enrollee, service: ServiceType, on: NaiveDate) -> EligibilityResult {
    let mut reasons = Vec::new();

    if enrollee.status != EnrolleeStatus::Active {
        reasons.push(IneligibilityReason::NotActive { status: enrollee.status });
    }

    if !enrollee.plan.covers(service) {
        reasons.push(IneligibilityReason::PlanExcludesService {
            plan: enrollee.plan,
            service,
        });
    }

    if on < enrollee.enrolled_on {
        reasons.push(IneligibilityReason::NotYetEnrolled {
            enrolled_on: enrollee.enrolled_on,
        });
    } else {
        let waiting = service.waiting_period_days();
        let eligible_from = enrollee.enrolled_on + chrono::Duration::days(waiting);
        if on < eligible_from {
            reasons.push(IneligibilityReason::WaitingPeriod { eligible_from });
        }
    }

    EligibilityResult {
        enrollee_id: enrollee.id,
        service,
        checked_on: on,
        plan: enrollee.plan,
        eligible: reasons.is_empty(),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollee::{Gender, NewEnrollee};

    fn enrollee(plan: PlanTier) -> Enrollee {
        Enrollee::new(NewEnrollee {
            first_name: "Bisi".to_string(),
            last_name: "Ade".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            gender: Gender::Female,
            nhia_number: None,
            phone: None,
            email: None,
            address: None,
            employer: None,
            plan,
            enrolled_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
    }

    #[test]
    fn test_consultation_eligible_on_enrollment_day() {
        let e = enrollee(PlanTier::Bronze);
        let result = check_eligibility(&e, ServiceType::Consultation, e.enrolled_on);
        assert!(result.eligible);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_surgery_waiting_period() {
        let e = enrollee(PlanTier::Silver);
        let early = check_eligibility(&e, ServiceType::Surgery, NaiveDate::from_ymd_opt(2024, 3, 30).unwrap());
        assert!(!early.eligible);
        assert_eq!(
            early.reasons,
            vec![IneligibilityReason::WaitingPeriod {
                eligible_from: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
            }]
        );

        let later = check_eligibility(&e, ServiceType::Surgery, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert!(later.eligible);
    }

    #[test]
    fn test_reports_every_failing_rule() {
        let mut e = enrollee(PlanTier::Bronze);
        e.suspend().unwrap();
        let result = check_eligibility(&e, ServiceType::Optical, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(!result.eligible);
        assert_eq!(result.reasons.len(), 2);
        assert!(result.reasons[1].describe().contains("does not cover optical"));
    }
}
