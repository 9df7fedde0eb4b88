//! Claims domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    #[error("Invalid stage transition from {from} to {to}")]
    InvalidStageTransition { from: String, to: String },

    /// Treatment lines can only be edited while a vetter holds the claim
    #[error("Claim treatments cannot be changed in stage {0}")]
    ClaimLocked(String),

    #[error("Claim is assigned to {assigned_to}, not {actor}")]
    NotAssignee { assigned_to: String, actor: String },

    #[error("Treatment line not found: {0}")]
    TreatmentNotFound(String),

    #[error("Invalid treatment: {0}")]
    InvalidTreatment(String),

    #[error("A claim needs at least one treatment line")]
    NoTreatments,

    #[error("Malformed ICD-10 code: {0}")]
    MalformedDiagnosis(String),

    #[error("ICD-10 code not recognised: {0}")]
    UnknownDiagnosis(String),

    #[error("A rejection reason is required")]
    RejectionReasonRequired,

    #[error("Invalid approval: {0}")]
    InvalidApproval(String),

    #[error("Claim {0} is not approved")]
    NotApproved(String),

    #[error("Claim {0} is already in a payment batch")]
    AlreadyBatched(String),

    #[error("Enrollee not eligible: {0}")]
    NotEligible(String),

    #[error("Prior authorization rejected: {0}")]
    InvalidAuthorization(String),

    #[error("Provider not contracted: {0}")]
    ProviderNotContracted(String),

    #[error("Invalid benefit schedule: {0}")]
    InvalidBenefitSchedule(String),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClaimError {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        ClaimError::ClaimNotFound(id.to_string())
    }

    pub fn invalid_treatment(message: impl Into<String>) -> Self {
        ClaimError::InvalidTreatment(message.into())
    }

    pub fn invalid_authorization(message: impl Into<String>) -> Self {
        ClaimError::InvalidAuthorization(message.into())
    }
}
