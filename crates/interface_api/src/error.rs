//! API error handling
//!
//! Domain and port errors are mapped onto HTTP statuses here so handlers can
//! use `?` throughout.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use core_kernel::{MoneyError, PortError, TemporalError};
use domain_billing::BillingError;
use domain_claims::ClaimError;
use domain_enrollment::EnrollmentError;
use domain_provider::ProviderError;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// A validation failure whose individual problems were joined with `"; "`
    fn validation_list(joined: &str) -> Self {
        ApiError::Validation {
            message: "Request failed validation".to_string(),
            details: joined.split("; ").map(str::to_string).collect(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::Validation { message, details } => {
                let details = (!details.is_empty()).then_some(details);
                ("validation_error", message, details)
            }
            ApiError::Unavailable(msg) => ("service_unavailable", msg, None),
            ApiError::Internal(msg) => {
                error!(message = %msg, "Internal error while handling request");
                ("internal_error", msg, None)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation { message, field } => ApiError::Validation {
                message,
                details: field.into_iter().collect(),
            },
            PortError::Conflict { message } => ApiError::Conflict(message),
            PortError::Connection { .. } | PortError::Timeout { .. } => {
                ApiError::Unavailable(err.to_string())
            }
            PortError::Unauthorized { message } => ApiError::Forbidden(message),
            PortError::Internal { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingPermission(_) => ApiError::Forbidden(err.to_string()),
            _ => ApiError::Unauthorized(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", field, message)
                })
            })
            .collect();
        details.sort();
        ApiError::Validation {
            message: "Request failed validation".to_string(),
            details,
        }
    }
}

impl From<TemporalError> for ApiError {
    fn from(err: TemporalError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<MoneyError> for ApiError {
    fn from(err: MoneyError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<EnrollmentError> for ApiError {
    fn from(err: EnrollmentError) -> Self {
        match err {
            EnrollmentError::EnrolleeNotFound(_) => ApiError::NotFound(err.to_string()),
            EnrollmentError::DuplicateEnrollee(_) => ApiError::Conflict(err.to_string()),
            EnrollmentError::InvalidData(_) => ApiError::validation(err.to_string()),
            EnrollmentError::ValidationFailed(ref joined) => ApiError::validation_list(joined),
            EnrollmentError::InvalidStatusTransition { .. } | EnrollmentError::Terminated => {
                ApiError::Conflict(err.to_string())
            }
            EnrollmentError::UploadRejected(_) => ApiError::BadRequest(err.to_string()),
            EnrollmentError::Port(port) => port.into(),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::ProviderNotFound(_) => ApiError::NotFound(err.to_string()),
            ProviderError::ValidationFailed(ref joined) => ApiError::validation_list(joined),
            ProviderError::InvalidData(_)
            | ProviderError::ContractNotExtended { .. }
            | ProviderError::Temporal(_) => ApiError::validation(err.to_string()),
            ProviderError::InvalidStatusTransition { .. } | ProviderError::Terminated => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::ClaimNotFound(_) | ClaimError::TreatmentNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ClaimError::InvalidStageTransition { .. }
            | ClaimError::ClaimLocked(_)
            | ClaimError::NotApproved(_)
            | ClaimError::AlreadyBatched(_) => ApiError::Conflict(err.to_string()),
            ClaimError::NotAssignee { .. } => ApiError::Forbidden(err.to_string()),
            ClaimError::InvalidTreatment(_)
            | ClaimError::NoTreatments
            | ClaimError::MalformedDiagnosis(_)
            | ClaimError::UnknownDiagnosis(_)
            | ClaimError::RejectionReasonRequired
            | ClaimError::InvalidApproval(_)
            | ClaimError::NotEligible(_)
            | ClaimError::InvalidAuthorization(_)
            | ClaimError::ProviderNotContracted(_)
            | ClaimError::Money(_) => ApiError::validation(err.to_string()),
            ClaimError::InvalidBenefitSchedule(_) | ClaimError::Internal(_) => {
                ApiError::Internal(err.to_string())
            }
            ClaimError::Port(port) => port.into(),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::BatchNotFound(_) => ApiError::NotFound(err.to_string()),
            BillingError::NoPayableClaims { .. }
            | BillingError::MissingReference
            | BillingError::CancellationReasonRequired
            | BillingError::Money(_) => ApiError::validation(err.to_string()),
            BillingError::InvalidStatusTransition { .. } => ApiError::Conflict(err.to_string()),
            BillingError::SelfApproval(_) => ApiError::Forbidden(err.to_string()),
            BillingError::Claim(claim) => claim.into(),
            BillingError::Port(port) => port.into(),
        }
    }
}
