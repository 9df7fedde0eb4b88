//! Claims vetting workflow
//!
//! ```text
//! ReadyForInitialVetting --pick--> UnderInitialVetting --forward--> PendingDoctorReview
//!          ^                            |      |                          |
//!          +----------release-----------+      +--reject--> Rejected      pick
//!                                                                         v
//!             Approved <--approve-- UnderDoctorReview --reject--> Rejected
//!                                          |
//!                                          +--release--> PendingDoctorReview
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClaimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VettingStage {
    ReadyForInitialVetting,
    UnderInitialVetting,
    PendingDoctorReview,
    UnderDoctorReview,
    Approved,
    Rejected,
}

impl VettingStage {
    pub const ALL: [VettingStage; 6] = [
        VettingStage::ReadyForInitialVetting,
        VettingStage::UnderInitialVetting,
        VettingStage::PendingDoctorReview,
        VettingStage::UnderDoctorReview,
        VettingStage::Approved,
        VettingStage::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VettingStage::ReadyForInitialVetting => "ready_for_initial_vetting",
            VettingStage::UnderInitialVetting => "under_initial_vetting",
            VettingStage::PendingDoctorReview => "pending_doctor_review",
            VettingStage::UnderDoctorReview => "under_doctor_review",
            VettingStage::Approved => "approved",
            VettingStage::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, target: VettingStage) -> bool {
        use VettingStage::*;
        matches!(
            (self, target),
            (ReadyForInitialVetting, UnderInitialVetting)
                | (UnderInitialVetting, PendingDoctorReview)
                | (UnderInitialVetting, Rejected)
                | (UnderInitialVetting, ReadyForInitialVetting)
                | (PendingDoctorReview, UnderDoctorReview)
                | (UnderDoctorReview, Approved)
                | (UnderDoctorReview, Rejected)
                | (UnderDoctorReview, PendingDoctorReview)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VettingStage::Approved | VettingStage::Rejected)
    }

    /// Treatment lines may be corrected while the claim is queued for or held by
    /// an initial vetter, or held by a reviewing doctor
    pub fn allows_treatment_edits(&self) -> bool {
        matches!(
            self,
            VettingStage::ReadyForInitialVetting
                | VettingStage::UnderInitialVetting
                | VettingStage::UnderDoctorReview
        )
    }

    /// Stages in which someone is working the claim
    pub fn is_held(&self) -> bool {
        matches!(
            self,
            VettingStage::UnderInitialVetting | VettingStage::UnderDoctorReview
        )
    }
}

impl fmt::Display for VettingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VettingStage {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VettingStage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ClaimError::Internal(format!("unknown vetting stage '{}'", s)))
    }
}

/// An entry in a claim's audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChange {
    pub from: VettingStage,
    pub to: VettingStage,
    pub actor: String,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_stages_have_no_exits() {
        for from in [VettingStage::Approved, VettingStage::Rejected] {
            assert!(VettingStage::ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn test_cannot_skip_doctor_review() {
        assert!(!VettingStage::UnderInitialVetting.can_transition_to(VettingStage::Approved));
        assert!(!VettingStage::ReadyForInitialVetting.can_transition_to(VettingStage::PendingDoctorReview));
    }

    #[test]
    fn test_pending_doctor_review_is_locked() {
        assert!(!VettingStage::PendingDoctorReview.allows_treatment_edits());
        assert!(VettingStage::UnderDoctorReview.allows_treatment_edits());
    }

    #[test]
    fn test_stage_names_round_trip() {
        for stage in VettingStage::ALL {
            assert_eq!(stage.as_str().parse::<VettingStage>().unwrap(), stage);
        }
    }
}
