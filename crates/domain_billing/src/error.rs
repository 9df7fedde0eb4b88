//! Billing domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};
use domain_claims::ClaimError;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Payment batch not found: {0}")]
    BatchNotFound(String),

    /// No approved, unbatched claims fell inside the period
    #[error("No payable claims between {start} and {end}")]
    NoPayableClaims { start: String, end: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Four-eyes rule: the creator of a batch may not approve it
    #[error("Batch {0} cannot be approved by the user who created it")]
    SelfApproval(String),

    #[error("A payment reference is required")]
    MissingReference,

    #[error("A cancellation reason is required")]
    CancellationReasonRequired,

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Port(#[from] PortError),
}
