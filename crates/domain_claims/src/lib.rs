//! Claims Domain
//!
//! Providers bill the HMO through claims: one or more treatment lines for an
//! enrollee's encounter, each tied to an ICD-10 diagnosis and, for
//! high-cost care, a prior authorization (PA) code. Claims are vetted by
//! claims officers and then reviewed by a doctor before approval.
//!
//! # Vetting Lifecycle
//!
//! ```text
//! Ready for initial vetting -> Under initial vetting -> Pending doctor review
//!     -> Under doctor review -> Approved / Rejected
//! ```
//!
//! Lines whose total is above the plan's benefit limit are flagged for the
//! reviewing doctor. Flags never block approval.

pub mod claim;
pub mod treatment;
pub mod vetting;
pub mod authorization;
pub mod icd10;
pub mod benefits;
pub mod service;
pub mod error;
pub mod ports;

pub use claim::{Claim, LineApproval, NewClaim};
pub use treatment::{NewTreatment, TreatmentLine};
pub use vetting::{StageChange, VettingStage};
pub use authorization::{AuthorizationStatus, NewAuthorization, PaCode, PriorAuthorization};
pub use icd10::validate_icd10;
pub use benefits::{BenefitCheck, BenefitSchedule};
pub use service::ClaimsService;
pub use error::ClaimError;
pub use ports::{ClaimQuery, ClaimsPort};

// Claims are priced per service type as defined by the plans
pub use domain_enrollment::ServiceType;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryClaimsPort;
