//! Enrollment Domain
//!
//! This crate manages plan members (enrollees): registration, plan changes,
//! membership status, eligibility checks at the point of care, and bulk
//! registration from spreadsheets exported by employer groups.
//!
//! # Membership Lifecycle
//!
//! ```text
//! Active <-> Suspended
//!    \         /
//!     Terminated
//! ```
//!
//! # Examples
//!
//! ```rust
//! use chrono::NaiveDate;
//! use domain_enrollment::{check_eligibility, Enrollee, NewEnrollee, PlanTier, ServiceType};
//!
//! let enrollee = Enrollee::new(NewEnrollee {
//!     first_name: "Adaeze".to_string(),
//!     last_name: "Okafor".to_string(),
//!     date_of_birth: NaiveDate::from_ymd_opt(1991, 4, 2).unwrap(),
//!     gender: Default::default(),
//!     nhia_number: None,
//!     phone: None,
//!     email: None,
//!     address: None,
//!     employer: None,
//!     plan: PlanTier::Gold,
//!     enrolled_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//! });
//!
//! let result = check_eligibility(&enrollee, ServiceType::Dental, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
//! assert!(result.eligible);
//! ```

pub mod enrollee;
pub mod plan;
pub mod eligibility;
pub mod bulk_upload;
pub mod validation;
pub mod service;
pub mod error;
pub mod ports;

pub use enrollee::{Enrollee, EnrolleeStatus, Gender, NewEnrollee};
pub use plan::{PlanTier, ServiceType};
pub use eligibility::{check_eligibility, EligibilityResult, IneligibilityReason};
pub use bulk_upload::{parse_enrollee_csv, RowError, UploadReport, ParsedUpload};
pub use error::EnrollmentError;
pub use validation::validate_new_enrollee;
pub use service::EnrollmentService;
pub use ports::{EnrolleePort, EnrolleeQuery};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryEnrolleePort;
