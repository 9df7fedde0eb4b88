//! Payment batch DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::DateRange;
use domain_billing::{BatchStatus, PaymentBatch};

use crate::error::ApiError;

/// Either an explicit period or any date in the month to batch
#[derive(Debug, Deserialize)]
pub struct CreateBatchRequest {
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub month: Option<NaiveDate>,
}

impl CreateBatchRequest {
    pub fn period(&self) -> Result<DateRange, ApiError> {
        match (self.period_start, self.period_end, self.month) {
            (Some(start), Some(end), None) => Ok(DateRange::new(start, end)?),
            (None, None, Some(month)) => Ok(DateRange::month_of(month)),
            _ => Err(ApiError::validation(
                "supply either period_start and period_end, or month",
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchListParams {
    pub status: Option<BatchStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PayBatchRequest {
    #[validate(length(min = 1, max = 100, message = "a payment reference is required"))]
    pub reference: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CancelBatchRequest {
    #[validate(length(min = 1, max = 1000, message = "a cancellation reason is required"))]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct BatchItemResponse {
    pub claim_id: Uuid,
    pub provider_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ProviderSummaryResponse {
    pub provider_id: Uuid,
    pub claim_count: usize,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub id: Uuid,
    pub batch_number: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub currency: String,
    pub status: BatchStatus,
    pub total: Decimal,
    pub claim_count: usize,
    pub providers: Vec<ProviderSummaryResponse>,
    pub items: Vec<BatchItemResponse>,
    pub created_by: String,
    pub approved_by: Option<String>,
    pub paid_reference: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentBatch> for BatchResponse {
    type Error = ApiError;

    fn try_from(batch: PaymentBatch) -> Result<Self, Self::Error> {
        let providers = batch
            .provider_summaries()?
            .into_iter()
            .map(|s| ProviderSummaryResponse {
                provider_id: s.provider_id.into(),
                claim_count: s.claim_count,
                total: s.total.amount(),
            })
            .collect();
        let items = batch
            .items
            .iter()
            .map(|i| BatchItemResponse {
                claim_id: i.claim_id.into(),
                provider_id: i.provider_id.into(),
                amount: i.amount.amount(),
            })
            .collect();

        Ok(Self {
            id: batch.id.into(),
            total: batch.total()?.amount(),
            claim_count: batch.items.len(),
            providers,
            items,
            batch_number: batch.batch_number,
            period_start: batch.period.start,
            period_end: batch.period.end,
            currency: batch.currency.code().to_string(),
            status: batch.status,
            created_by: batch.created_by,
            approved_by: batch.approved_by,
            paid_reference: batch.paid_reference,
            cancellation_reason: batch.cancellation_reason,
            created_at: batch.created_at,
            approved_at: batch.approved_at,
            paid_at: batch.paid_at,
        })
    }
}
