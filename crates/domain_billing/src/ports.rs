//! Billing Domain Ports
//!
//! - **Internal Adapter**: PostgreSQL (`infra_db::adapters::PostgresPaymentBatchAdapter`)
//! - **In-memory Adapter**: [`mock::InMemoryPaymentBatchPort`]

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, OperationMetadata, PaymentBatchId, PortError};

use crate::batch::{BatchStatus, PaymentBatch};

/// Storage port for payment batches
///
/// `list_batches` returns newest first.
#[async_trait]
pub trait PaymentBatchPort: DomainPort + HealthCheckable {
    async fn get_batch(
        &self,
        id: PaymentBatchId,
        metadata: Option<OperationMetadata>,
    ) -> Result<PaymentBatch, PortError>;

    async fn list_batches(
        &self,
        status: Option<BatchStatus>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<PaymentBatch>, PortError>;

    async fn create_batch(
        &self,
        batch: &PaymentBatch,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    async fn update_batch(
        &self,
        batch: &PaymentBatch,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryPaymentBatchPort {
        batches: Arc<RwLock<HashMap<PaymentBatchId, PaymentBatch>>>,
    }

    impl InMemoryPaymentBatchPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for InMemoryPaymentBatchPort {}

    #[async_trait]
    impl HealthCheckable for InMemoryPaymentBatchPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-payment-batch-port")
        }
    }

    #[async_trait]
    impl PaymentBatchPort for InMemoryPaymentBatchPort {
        async fn get_batch(
            &self,
            id: PaymentBatchId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<PaymentBatch, PortError> {
            self.batches
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("PaymentBatch", id))
        }

        async fn list_batches(
            &self,
            status: Option<BatchStatus>,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<PaymentBatch>, PortError> {
            let store = self.batches.read().await;
            let mut results: Vec<PaymentBatch> = store
                .values()
                .filter(|b| status.map_or(true, |s| b.status == s))
                .cloned()
                .collect();
            results.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(results)
        }

        async fn create_batch(
            &self,
            batch: &PaymentBatch,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut store = self.batches.write().await;
            if store.contains_key(&batch.id)
                || store.values().any(|b| b.batch_number == batch.batch_number)
            {
                return Err(PortError::conflict(format!("batch {} already exists", batch.batch_number)));
            }
            store.insert(batch.id, batch.clone());
            Ok(())
        }

        async fn update_batch(
            &self,
            batch: &PaymentBatch,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut store = self.batches.write().await;
            match store.get_mut(&batch.id) {
                Some(existing) => {
                    *existing = batch.clone();
                    Ok(())
                }
                None => Err(PortError::not_found("PaymentBatch", batch.id)),
            }
        }
    }
}
