//! PostgreSQL Payment Batch Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PaymentBatchId, PortError,
};
use domain_billing::{BatchStatus, PaymentBatch, PaymentBatchPort};

use super::{convert_rows, ping};
use crate::repositories::PaymentBatchRepository;

#[derive(Debug, Clone)]
pub struct PostgresPaymentBatchAdapter {
    repository: PaymentBatchRepository,
    pool: PgPool,
}

impl PostgresPaymentBatchAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PaymentBatchRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresPaymentBatchAdapter {}

#[async_trait]
impl HealthCheckable for PostgresPaymentBatchAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-payment-batch-adapter").await
    }
}

#[async_trait]
impl PaymentBatchPort for PostgresPaymentBatchAdapter {
    #[instrument(skip(self, _metadata), fields(batch_id = %id))]
    async fn get_batch(
        &self,
        id: PaymentBatchId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<PaymentBatch, PortError> {
        let row = self.repository.get_by_id(id.into()).await?;
        Ok(PaymentBatch::try_from(row)?)
    }

    #[instrument(skip(self, _metadata))]
    async fn list_batches(
        &self,
        status: Option<BatchStatus>,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<PaymentBatch>, PortError> {
        convert_rows(self.repository.list(status).await?)
    }

    #[instrument(skip(self, batch, _metadata), fields(batch_number = %batch.batch_number))]
    async fn create_batch(
        &self,
        batch: &PaymentBatch,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.repository.insert(batch).await?;
        Ok(())
    }

    #[instrument(skip(self, batch, _metadata), fields(batch_number = %batch.batch_number, status = %batch.status))]
    async fn update_batch(
        &self,
        batch: &PaymentBatch,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.repository.update(batch).await?;
        Ok(())
    }
}
