//! Claims repository
//!
//! Treatment lines and the vetting history travel with the claim as JSONB
//! columns; they are never queried on their own.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use core_kernel::{ClaimId, Currency, EnrolleeId, Money, PaymentBatchId, ProviderId};
use domain_claims::{Claim, ClaimQuery, PaCode, StageChange, TreatmentLine, VettingStage};

use super::{page_bound, parse_column};
use crate::error::DatabaseError;

const SELECT_CLAIMS: &str = r#"
    SELECT claim_id, claim_number, pa_code, enrollee_id, provider_id, plan_tier,
           diagnosis_codes, encounter_date, currency, treatments, stage, history,
           approved_amount, rejection_reason, assigned_to, batch_id, created_at, updated_at
    FROM claims
"#;

/// Repository for claims moving through vetting and payment
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, claim_id: Uuid) -> Result<ClaimRow, DatabaseError> {
        sqlx::query_as::<_, ClaimRow>(&format!("{SELECT_CLAIMS} WHERE claim_id = $1"))
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", ClaimId::from(claim_id)))
    }

    /// Filtered listing, oldest first so vetting queues are worked in order
    pub async fn find(&self, query: &ClaimQuery) -> Result<Vec<ClaimRow>, DatabaseError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_CLAIMS);
        builder.push(" WHERE TRUE");

        if let Some(stage) = query.stage {
            builder.push(" AND stage = ").push_bind(stage.as_str());
        }
        if let Some(provider_id) = query.provider_id {
            builder.push(" AND provider_id = ").push_bind(Uuid::from(provider_id));
        }
        if let Some(enrollee_id) = query.enrollee_id {
            builder.push(" AND enrollee_id = ").push_bind(Uuid::from(enrollee_id));
        }
        if query.unbatched_only {
            builder
                .push(" AND stage = ")
                .push_bind(VettingStage::Approved.as_str())
                .push(" AND batch_id IS NULL");
        }

        builder
            .push(" ORDER BY created_at, claim_id LIMIT ")
            .push_bind(page_bound(query.limit, i64::MAX))
            .push(" OFFSET ")
            .push_bind(page_bound(query.offset, 0));

        Ok(builder.build_query_as::<ClaimRow>().fetch_all(&self.pool).await?)
    }

    pub async fn insert(&self, claim: &Claim) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO claims (
                claim_id, claim_number, pa_code, enrollee_id, provider_id, plan_tier,
                diagnosis_codes, encounter_date, currency, treatments, stage, history,
                approved_amount, rejection_reason, assigned_to, batch_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(Uuid::from(claim.id))
        .bind(&claim.claim_number)
        .bind(claim.pa_code.as_ref().map(|c| c.as_str().to_string()))
        .bind(Uuid::from(claim.enrollee_id))
        .bind(Uuid::from(claim.provider_id))
        .bind(claim.plan_tier.as_str())
        .bind(&claim.diagnosis_codes)
        .bind(claim.encounter_date)
        .bind(claim.currency.code())
        .bind(Json(&claim.treatments))
        .bind(claim.stage.as_str())
        .bind(Json(&claim.history))
        .bind(claim.approved_amount.map(|m| m.amount()))
        .bind(&claim.rejection_reason)
        .bind(&claim.assigned_to)
        .bind(claim.batch_id.map(Uuid::from))
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Writes back every mutable column of the claim
    pub async fn update(&self, claim: &Claim) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE claims SET
                plan_tier = $2, diagnosis_codes = $3, treatments = $4, stage = $5,
                history = $6, approved_amount = $7, rejection_reason = $8,
                assigned_to = $9, batch_id = $10, updated_at = $11
            WHERE claim_id = $1
            "#,
        )
        .bind(Uuid::from(claim.id))
        .bind(claim.plan_tier.as_str())
        .bind(&claim.diagnosis_codes)
        .bind(Json(&claim.treatments))
        .bind(claim.stage.as_str())
        .bind(Json(&claim.history))
        .bind(claim.approved_amount.map(|m| m.amount()))
        .bind(&claim.rejection_reason)
        .bind(&claim.assigned_to)
        .bind(claim.batch_id.map(Uuid::from))
        .bind(claim.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Claim", claim.id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub claim_number: String,
    pub pa_code: Option<String>,
    pub enrollee_id: Uuid,
    pub provider_id: Uuid,
    pub plan_tier: String,
    pub diagnosis_codes: Vec<String>,
    pub encounter_date: NaiveDate,
    pub currency: String,
    pub treatments: Json<Vec<TreatmentLine>>,
    pub stage: String,
    pub history: Json<Vec<StageChange>>,
    pub approved_amount: Option<Decimal>,
    pub rejection_reason: Option<String>,
    pub assigned_to: Option<String>,
    pub batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for Claim {
    type Error = DatabaseError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        let currency: Currency = parse_column("currency", &row.currency)?;
        let pa_code = row
            .pa_code
            .as_deref()
            .map(|raw| parse_column::<PaCode>("pa_code", raw))
            .transpose()?;

        Ok(Claim {
            id: ClaimId::from(row.claim_id),
            claim_number: row.claim_number,
            pa_code,
            enrollee_id: EnrolleeId::from(row.enrollee_id),
            provider_id: ProviderId::from(row.provider_id),
            plan_tier: parse_column("plan_tier", &row.plan_tier)?,
            diagnosis_codes: row.diagnosis_codes,
            encounter_date: row.encounter_date,
            currency,
            treatments: row.treatments.0,
            stage: parse_column("stage", &row.stage)?,
            history: row.history.0,
            approved_amount: row.approved_amount.map(|amount| Money::new(amount, currency)),
            rejection_reason: row.rejection_reason,
            assigned_to: row.assigned_to,
            batch_id: row.batch_id.map(PaymentBatchId::from),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
