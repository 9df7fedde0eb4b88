//! Prior authorization (PA) codes
//!
//! Non-emergency and high-cost treatment needs a PA code issued by the HMO
//! before the provider renders care. The code is quoted on the claim and
//! consumed when the claim is submitted.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AuthorizationId, EnrolleeId, ProviderId};
use domain_enrollment::ServiceType;
use crate::error::ClaimError;
use crate::icd10::validate_icd10;

/// Default validity of a PA code
pub const DEFAULT_VALIDITY_DAYS: i64 = 30;

static PA_CODE_FORMAT: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^PA-[0-9]{10,}-[0-9]{3}$"));

/// A prior authorization code: `PA-<unix millis>-<3 random digits>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaCode(String);

impl PaCode {
    /// Generates a fresh code stamped with `now`
    ///
    /// Two codes generated in the same millisecond collide one time in a
    /// thousand; callers check the port before persisting.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix: u16 = rand::thread_rng().gen_range(0..1000);
        PaCode(format!("PA-{}-{:03}", now.timestamp_millis(), suffix))
    }

    pub fn parse(raw: &str) -> Result<Self, ClaimError> {
        let candidate = raw.trim().to_ascii_uppercase();
        let re = PA_CODE_FORMAT
            .as_ref()
            .map_err(|e| ClaimError::Internal(format!("PA code pattern: {}", e)))?;
        if !re.is_match(&candidate) {
            return Err(ClaimError::invalid_authorization(format!(
                "'{}' is not a PA code",
                raw.trim()
            )));
        }
        Ok(PaCode(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PaCode {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaCode::parse(s)
    }
}

impl TryFrom<String> for PaCode {
    type Error = ClaimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PaCode::parse(&value)
    }
}

impl From<PaCode> for String {
    fn from(code: PaCode) -> Self {
        code.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    Active,
    /// Consumed by a submitted claim
    Used,
    Expired,
    Cancelled,
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::Active => "active",
            AuthorizationStatus::Used => "used",
            AuthorizationStatus::Expired => "expired",
            AuthorizationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthorizationStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AuthorizationStatus::Active),
            "used" => Ok(AuthorizationStatus::Used),
            "expired" => Ok(AuthorizationStatus::Expired),
            "cancelled" => Ok(AuthorizationStatus::Cancelled),
            other => Err(ClaimError::invalid_authorization(format!("unknown status '{}'", other))),
        }
    }
}

/// Request for a PA code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuthorization {
    pub enrollee_id: EnrolleeId,
    pub provider_id: ProviderId,
    pub diagnosis_code: String,
    pub services: Vec<ServiceType>,
    /// Defaults to [`DEFAULT_VALIDITY_DAYS`]
    #[serde(default)]
    pub validity_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorAuthorization {
    pub id: AuthorizationId,
    pub code: PaCode,
    pub enrollee_id: EnrolleeId,
    pub provider_id: ProviderId,
    pub diagnosis_code: String,
    pub services: Vec<ServiceType>,
    pub status: AuthorizationStatus,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub issued_by: String,
    pub used_at: Option<DateTime<Utc>>,
}

impl PriorAuthorization {
    /// Builds an active authorization under `code`
    pub fn issue(
        code: PaCode,
        request: NewAuthorization,
        issued_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        let diagnosis_code = validate_icd10(&request.diagnosis_code)?;
        if request.services.is_empty() {
            return Err(ClaimError::invalid_authorization("at least one service is required"));
        }
        let validity = request.validity_days.unwrap_or(DEFAULT_VALIDITY_DAYS);
        if validity <= 0 {
            return Err(ClaimError::invalid_authorization("validity must be at least one day"));
        }

        let mut services = request.services;
        services.sort();
        services.dedup();

        Ok(Self {
            id: AuthorizationId::new_v7(),
            code,
            enrollee_id: request.enrollee_id,
            provider_id: request.provider_id,
            diagnosis_code,
            services,
            status: AuthorizationStatus::Active,
            issued_at: now,
            expires_at: now + Duration::days(validity),
            issued_by: issued_by.into(),
            used_at: None,
        })
    }

    /// Active and not yet past expiry
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.status == AuthorizationStatus::Active && at < self.expires_at
    }

    /// Status as it stands at `at`, reporting lapsed active codes as expired
    pub fn status_at(&self, at: DateTime<Utc>) -> AuthorizationStatus {
        if self.status == AuthorizationStatus::Active && at >= self.expires_at {
            AuthorizationStatus::Expired
        } else {
            self.status
        }
    }

    pub fn covers(&self, service: ServiceType) -> bool {
        self.services.contains(&service)
    }

    pub fn mark_used(&mut self, at: DateTime<Utc>) -> Result<(), ClaimError> {
        if !self.is_valid_at(at) {
            return Err(ClaimError::invalid_authorization(format!(
                "{} is {}",
                self.code,
                self.status_at(at)
            )));
        }
        self.status = AuthorizationStatus::Used;
        self.used_at = Some(at);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), ClaimError> {
        if self.status != AuthorizationStatus::Active {
            return Err(ClaimError::invalid_authorization(format!(
                "{} is {} and cannot be cancelled",
                self.code, self.status
            )));
        }
        self.status = AuthorizationStatus::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn request() -> NewAuthorization {
        NewAuthorization {
            enrollee_id: EnrolleeId::new(),
            provider_id: ProviderId::new(),
            diagnosis_code: "k35.8".to_string(),
            services: vec![ServiceType::Surgery, ServiceType::Admission, ServiceType::Surgery],
            validity_days: None,
        }
    }

    #[test]
    fn test_generated_code_format() {
        let code = PaCode::generate(now());
        let text = code.to_string();
        assert!(text.starts_with(&format!("PA-{}-", now().timestamp_millis())));
        assert_eq!(PaCode::parse(&text).unwrap(), code);
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(PaCode::parse("PA-1709285400000-12").is_err());
        assert!(PaCode::parse("XX-1709285400000-123").is_err());
        assert_eq!(
            PaCode::parse(" pa-1709285400000-042 ").unwrap().as_str(),
            "PA-1709285400000-042"
        );
    }

    #[test]
    fn test_issue_normalises_request() {
        let pa = PriorAuthorization::issue(PaCode::generate(now()), request(), "desk-officer", now()).unwrap();
        assert_eq!(pa.diagnosis_code, "K35.8");
        assert_eq!(pa.services, vec![ServiceType::Surgery, ServiceType::Admission]);
        assert_eq!(pa.expires_at, now() + Duration::days(30));
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let mut pa = PriorAuthorization::issue(PaCode::generate(now()), request(), "desk-officer", now()).unwrap();
        let expiry = pa.expires_at;
        assert!(pa.is_valid_at(expiry - Duration::seconds(1)));
        assert!(!pa.is_valid_at(expiry));
        assert_eq!(pa.status_at(expiry), AuthorizationStatus::Expired);
        assert!(pa.mark_used(expiry).is_err());
    }

    #[test]
    fn test_used_code_cannot_be_reused_or_cancelled() {
        let mut pa = PriorAuthorization::issue(PaCode::generate(now()), request(), "desk-officer", now()).unwrap();
        pa.mark_used(now()).unwrap();
        assert!(pa.mark_used(now()).is_err());
        assert!(pa.cancel().is_err());
    }

    #[test]
    fn test_serde_validates_code() {
        let bad: Result<PaCode, _> = serde_json::from_str("\"PA-1\"");
        assert!(bad.is_err());
    }
}
