//! Enrollee aggregate

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{age_on, EnrolleeId, TemporalError};
use crate::error::EnrollmentError;
use crate::plan::PlanTier;

/// Membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrolleeStatus {
    Active,
    /// Temporarily barred from care, e.g. for premium arrears
    Suspended,
    Terminated,
}

impl EnrolleeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrolleeStatus::Active => "active",
            EnrolleeStatus::Suspended => "suspended",
            EnrolleeStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for EnrolleeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrolleeStatus {
    type Err = EnrollmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(EnrolleeStatus::Active),
            "suspended" => Ok(EnrolleeStatus::Suspended),
            "terminated" => Ok(EnrolleeStatus::Terminated),
            other => Err(EnrollmentError::invalid(format!("unknown status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    /// Lenient parse used for spreadsheet imports; anything unrecognised is `Other`
    pub fn parse_lenient(raw: &str) -> Gender {
        match raw.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Gender::Male,
            "f" | "female" => Gender::Female,
            _ => Gender::Other,
        }
    }
}

/// Data required to register a new enrollee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewEnrollee {
    #[validate(length(min = 1, max = 100, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last name is required"))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub gender: Gender,
    #[validate(length(min = 4, max = 32, message = "NHIA number must be 4-32 characters"))]
    pub nhia_number: Option<String>,
    #[validate(length(min = 7, max = 20, message = "phone number must be 7-20 characters"))]
    pub phone: Option<String>,
    #[validate(email(message = "email address is malformed"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub employer: Option<String>,
    #[serde(default)]
    pub plan: PlanTier,
    pub enrolled_on: NaiveDate,
}

/// A plan member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollee {
    pub id: EnrolleeId,
    /// Human-facing membership number printed on the member card
    pub enrollee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub nhia_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub employer: Option<String>,
    pub plan: PlanTier,
    pub status: EnrolleeStatus,
    pub enrolled_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollee {
    /// Registers a new active enrollee
    pub fn new(data: NewEnrollee) -> Self {
        let now = Utc::now();
        Self {
            id: EnrolleeId::new_v7(),
            enrollee_number: generate_enrollee_number(data.enrolled_on.year()),
            first_name: data.first_name.trim().to_string(),
            last_name: data.last_name.trim().to_string(),
            date_of_birth: data.date_of_birth,
            gender: data.gender,
            nhia_number: data.nhia_number,
            phone: data.phone,
            email: data.email.map(|e| e.trim().to_ascii_lowercase()),
            address: data.address,
            employer: data.employer,
            plan: data.plan,
            status: EnrolleeStatus::Active,
            enrolled_on: data.enrolled_on,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn age_on(&self, date: NaiveDate) -> Result<u32, TemporalError> {
        age_on(self.date_of_birth, date)
    }

    pub fn is_active(&self) -> bool {
        self.status == EnrolleeStatus::Active
    }

    /// Moves the member to another plan tier
    pub fn change_plan(&mut self, plan: PlanTier) -> Result<(), EnrollmentError> {
        if self.status == EnrolleeStatus::Terminated {
            return Err(EnrollmentError::Terminated);
        }
        self.plan = plan;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn suspend(&mut self) -> Result<(), EnrollmentError> {
        self.transition(EnrolleeStatus::Suspended)
    }

    pub fn reactivate(&mut self) -> Result<(), EnrollmentError> {
        self.transition(EnrolleeStatus::Active)
    }

    pub fn terminate(&mut self) -> Result<(), EnrollmentError> {
        self.transition(EnrolleeStatus::Terminated)
    }

    /// Applies a status change requested by name
    pub fn set_status(&mut self, status: EnrolleeStatus) -> Result<(), EnrollmentError> {
        self.transition(status)
    }

    fn transition(&mut self, target: EnrolleeStatus) -> Result<(), EnrollmentError> {
        use EnrolleeStatus::*;
        let allowed = matches!(
            (self.status, target),
            (Active, Suspended) | (Suspended, Active) | (Active, Terminated) | (Suspended, Terminated)
        );
        if !allowed {
            return Err(EnrollmentError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        tracing::debug!(enrollee = %self.id, from = %self.status, to = %target, "Enrollee status change");
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Membership number in the form `HMO/<year>/<6 digits>`
fn generate_enrollee_number(year: i32) -> String {
    let serial: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("HMO/{}/{:06}", year, serial)
}
