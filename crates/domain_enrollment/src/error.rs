//! Enrollment domain errors

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur in the enrollment domain
#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("Enrollee not found: {0}")]
    EnrolleeNotFound(String),

    #[error("Duplicate enrollee: {0}")]
    DuplicateEnrollee(String),

    #[error("Invalid enrollee data: {0}")]
    InvalidData(String),

    #[error("Enrollee validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Membership terminated")]
    Terminated,

    /// The upload could not be read at all (as opposed to individual bad rows)
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl EnrollmentError {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        EnrollmentError::EnrolleeNotFound(id.to_string())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        EnrollmentError::InvalidData(message.into())
    }

    pub fn validation_failed(errors: Vec<String>) -> Self {
        EnrollmentError::ValidationFailed(errors.join("; "))
    }
}

impl From<csv::Error> for EnrollmentError {
    fn from(err: csv::Error) -> Self {
        EnrollmentError::UploadRejected(err.to_string())
    }
}
