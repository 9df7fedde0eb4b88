//! Provider domain errors

use chrono::NaiveDate;
use thiserror::Error;

use core_kernel::TemporalError;

/// Errors that can occur in the provider domain
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Invalid provider data: {0}")]
    InvalidData(String),

    #[error("Provider validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Provider contract has been terminated")]
    Terminated,

    /// A renewal must push the contract end date forward
    #[error("Renewal end date {requested} does not extend current end {current}")]
    ContractNotExtended { current: NaiveDate, requested: NaiveDate },

    #[error(transparent)]
    Temporal(#[from] TemporalError),
}

impl ProviderError {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        ProviderError::ProviderNotFound(id.to_string())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ProviderError::InvalidData(message.into())
    }

    pub fn validation_failed(errors: Vec<String>) -> Self {
        ProviderError::ValidationFailed(errors.join("; "))
    }
}
