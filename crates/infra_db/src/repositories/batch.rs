//! Payment batch repository

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use core_kernel::{DateRange, PaymentBatchId};
use domain_billing::{BatchItem, BatchStatus, PaymentBatch};

use super::parse_column;
use crate::error::DatabaseError;

const SELECT_BATCHES: &str = r#"
    SELECT batch_id, batch_number, period_start, period_end, currency, items, status,
           created_by, approved_by, paid_reference, cancellation_reason,
           created_at, approved_at, paid_at, updated_at
    FROM payment_batches
"#;

#[derive(Debug, Clone)]
pub struct PaymentBatchRepository {
    pool: PgPool,
}

impl PaymentBatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, batch_id: Uuid) -> Result<BatchRow, DatabaseError> {
        sqlx::query_as::<_, BatchRow>(&format!("{SELECT_BATCHES} WHERE batch_id = $1"))
            .bind(batch_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("PaymentBatch", PaymentBatchId::from(batch_id)))
    }

    /// Newest first
    pub async fn list(&self, status: Option<BatchStatus>) -> Result<Vec<BatchRow>, DatabaseError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_BATCHES);
        if let Some(status) = status {
            builder.push(" WHERE status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC, batch_id DESC");
        Ok(builder.build_query_as::<BatchRow>().fetch_all(&self.pool).await?)
    }

    pub async fn insert(&self, batch: &PaymentBatch) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO payment_batches (
                batch_id, batch_number, period_start, period_end, currency, items, status,
                created_by, approved_by, paid_reference, cancellation_reason,
                created_at, approved_at, paid_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(Uuid::from(batch.id))
        .bind(&batch.batch_number)
        .bind(batch.period.start)
        .bind(batch.period.end)
        .bind(batch.currency.code())
        .bind(Json(&batch.items))
        .bind(batch.status.as_str())
        .bind(&batch.created_by)
        .bind(&batch.approved_by)
        .bind(&batch.paid_reference)
        .bind(&batch.cancellation_reason)
        .bind(batch.created_at)
        .bind(batch.approved_at)
        .bind(batch.paid_at)
        .bind(batch.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Items are fixed at creation; only the approval trail changes
    pub async fn update(&self, batch: &PaymentBatch) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE payment_batches SET
                status = $2, approved_by = $3, paid_reference = $4, cancellation_reason = $5,
                approved_at = $6, paid_at = $7, updated_at = $8
            WHERE batch_id = $1
            "#,
        )
        .bind(Uuid::from(batch.id))
        .bind(batch.status.as_str())
        .bind(&batch.approved_by)
        .bind(&batch.paid_reference)
        .bind(&batch.cancellation_reason)
        .bind(batch.approved_at)
        .bind(batch.paid_at)
        .bind(batch.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("PaymentBatch", batch.id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BatchRow {
    pub batch_id: Uuid,
    pub batch_number: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub currency: String,
    pub items: Json<Vec<BatchItem>>,
    pub status: String,
    pub created_by: String,
    pub approved_by: Option<String>,
    pub paid_reference: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BatchRow> for PaymentBatch {
    type Error = DatabaseError;

    fn try_from(row: BatchRow) -> Result<Self, Self::Error> {
        let period = DateRange::new(row.period_start, row.period_end)
            .map_err(|e| DatabaseError::decode("period_end", e))?;

        Ok(PaymentBatch {
            id: PaymentBatchId::from(row.batch_id),
            batch_number: row.batch_number,
            period,
            currency: parse_column("currency", &row.currency)?,
            items: row.items.0,
            status: parse_column("status", &row.status)?,
            created_by: row.created_by,
            approved_by: row.approved_by,
            paid_reference: row.paid_reference,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            approved_at: row.approved_at,
            paid_at: row.paid_at,
            updated_at: row.updated_at,
        })
    }
}
