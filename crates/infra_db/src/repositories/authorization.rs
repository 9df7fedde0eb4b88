//! Prior authorization (PA code) repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{AuthorizationId, EnrolleeId, ProviderId};
use domain_claims::{PaCode, PriorAuthorization, ServiceType};

use super::parse_column;
use crate::error::DatabaseError;

const SELECT_AUTHORIZATIONS: &str = r#"
    SELECT authorization_id, pa_code, enrollee_id, provider_id, diagnosis_code, services,
           status, issued_at, expires_at, issued_by, used_at
    FROM prior_authorizations
"#;

#[derive(Debug, Clone)]
pub struct AuthorizationRepository {
    pool: PgPool,
}

impl AuthorizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_code(&self, code: &PaCode) -> Result<AuthorizationRow, DatabaseError> {
        sqlx::query_as::<_, AuthorizationRow>(&format!("{SELECT_AUTHORIZATIONS} WHERE pa_code = $1"))
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("PriorAuthorization", code))
    }

    pub async fn code_exists(&self, code: &PaCode) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM prior_authorizations WHERE pa_code = $1)",
        )
        .bind(code.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Inserts a new authorization; a taken code surfaces as `DuplicateEntry`
    pub async fn insert(&self, authorization: &PriorAuthorization) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO prior_authorizations (
                authorization_id, pa_code, enrollee_id, provider_id, diagnosis_code,
                services, status, issued_at, expires_at, issued_by, used_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::from(authorization.id))
        .bind(authorization.code.as_str())
        .bind(Uuid::from(authorization.enrollee_id))
        .bind(Uuid::from(authorization.provider_id))
        .bind(&authorization.diagnosis_code)
        .bind(service_names(&authorization.services))
        .bind(authorization.status.as_str())
        .bind(authorization.issued_at)
        .bind(authorization.expires_at)
        .bind(&authorization.issued_by)
        .bind(authorization.used_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Only status and usage change after issue
    pub async fn update(&self, authorization: &PriorAuthorization) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE prior_authorizations SET status = $2, used_at = $3 WHERE authorization_id = $1",
        )
        .bind(Uuid::from(authorization.id))
        .bind(authorization.status.as_str())
        .bind(authorization.used_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("PriorAuthorization", &authorization.code));
        }
        Ok(())
    }
}

fn service_names(services: &[ServiceType]) -> Vec<String> {
    services.iter().map(|s| s.as_str().to_string()).collect()
}

#[derive(Debug, Clone, FromRow)]
pub struct AuthorizationRow {
    pub authorization_id: Uuid,
    pub pa_code: String,
    pub enrollee_id: Uuid,
    pub provider_id: Uuid,
    pub diagnosis_code: String,
    pub services: Vec<String>,
    pub status: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub issued_by: String,
    pub used_at: Option<DateTime<Utc>>,
}

impl TryFrom<AuthorizationRow> for PriorAuthorization {
    type Error = DatabaseError;

    fn try_from(row: AuthorizationRow) -> Result<Self, Self::Error> {
        let services = row
            .services
            .iter()
            .map(|s| parse_column::<ServiceType>("services", s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PriorAuthorization {
            id: AuthorizationId::from(row.authorization_id),
            code: parse_column("pa_code", &row.pa_code)?,
            enrollee_id: EnrolleeId::from(row.enrollee_id),
            provider_id: ProviderId::from(row.provider_id),
            diagnosis_code: row.diagnosis_code,
            services,
            status: parse_column("status", &row.status)?,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
            issued_by: row.issued_by,
            used_at: row.used_at,
        })
    }
}
