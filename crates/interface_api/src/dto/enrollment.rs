//! Enrollment DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_enrollment::{Enrollee, EnrolleeQuery, EnrolleeStatus, Gender, NewEnrollee, PlanTier, ServiceType};

use super::page_limit;

#[derive(Debug, Deserialize)]
pub struct RegisterEnrolleeRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub gender: Gender,
    pub nhia_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub employer: Option<String>,
    #[serde(default)]
    pub plan: PlanTier,
    /// Defaults to the day of registration
    pub enrolled_on: Option<NaiveDate>,
}

impl RegisterEnrolleeRequest {
    pub fn into_new_enrollee(self, today: NaiveDate) -> NewEnrollee {
        NewEnrollee {
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            nhia_number: self.nhia_number,
            phone: self.phone,
            email: self.email,
            address: self.address,
            employer: self.employer,
            plan: self.plan,
            enrolled_on: self.enrolled_on.unwrap_or(today),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EnrolleeListParams {
    pub status: Option<EnrolleeStatus>,
    pub plan: Option<PlanTier>,
    pub employer: Option<String>,
    /// Matches name, enrollee number or NHIA number
    pub q: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<EnrolleeListParams> for EnrolleeQuery {
    fn from(params: EnrolleeListParams) -> Self {
        EnrolleeQuery {
            status: params.status,
            plan: params.plan,
            search: params.q.filter(|q| !q.trim().is_empty()),
            employer: params.employer,
            limit: Some(page_limit(params.limit)),
            offset: params.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePlanRequest {
    pub plan: PlanTier,
}

#[derive(Debug, Deserialize)]
pub struct SetEnrolleeStatusRequest {
    pub status: EnrolleeStatus,
}

#[derive(Debug, Deserialize)]
pub struct EligibilityParams {
    pub service: ServiceType,
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct EnrolleeResponse {
    pub id: Uuid,
    pub enrollee_number: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub age: Option<u32>,
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

impl From<Enrollee> for EnrolleeResponse {
    fn from(enrollee: Enrollee) -> Self {
        Self {
            id: enrollee.id.into(),
            full_name: enrollee.full_name(),
            age: enrollee.age_on(Utc::now().date_naive()).ok(),
            enrollee_number: enrollee.enrollee_number,
            first_name: enrollee.first_name,
            last_name: enrollee.last_name,
            date_of_birth: enrollee.date_of_birth,
            gender: enrollee.gender,
            nhia_number: enrollee.nhia_number,
            phone: enrollee.phone,
            email: enrollee.email,
            address: enrollee.address,
            employer: enrollee.employer,
            plan: enrollee.plan,
            status: enrollee.status,
            enrolled_on: enrollee.enrolled_on,
            created_at: enrollee.created_at,
            updated_at: enrollee.updated_at,
        }
    }
}
