//! Payment batch orchestration
//!
//! Keeps claims and batches consistent: claims are stamped with the batch
//! when it is created and released again when it is cancelled. Claims are
//! written before the batch, and a failure part way through undoes the claim
//! writes already made, so a claim is never payable while a live batch holds
//! it.

use std::sync::Arc;
use tracing::{error, info, instrument};

use core_kernel::{ClaimId, DateRange, OperationMetadata, PaymentBatchId};
use domain_claims::{Claim, ClaimQuery, ClaimsPort};

use crate::batch::{BatchStatus, PaymentBatch};
use crate::error::BillingError;
use crate::ports::PaymentBatchPort;

#[derive(Clone)]
pub struct PaymentBatchService {
    batches: Arc<dyn PaymentBatchPort>,
    claims: Arc<dyn ClaimsPort>,
}

impl PaymentBatchService {
    pub fn new(batches: Arc<dyn PaymentBatchPort>, claims: Arc<dyn ClaimsPort>) -> Self {
        Self { batches, claims }
    }

    /// Batches every payable claim with an encounter inside `period`
    #[instrument(skip(self), fields(start = %period.start, end = %period.end))]
    pub async fn create_batch(&self, period: DateRange, actor: &str) -> Result<PaymentBatch, BillingError> {
        let metadata = Some(OperationMetadata::for_user(actor));
        let payable = self.claims.find_claims(ClaimQuery::payable(), metadata.clone()).await?;
        let batch = PaymentBatch::from_claims(period, &payable, actor)?;
        let total = batch.total()?;

        let members = batch.claim_ids();
        let claims: Vec<Claim> = payable.into_iter().filter(|c| members.contains(&c.id)).collect();
        let stamped = self.stamp_claims(claims, batch.id, &metadata).await?;

        if let Err(err) = self.batches.create_batch(&batch, metadata.clone()).await {
            self.unstamp_claims(stamped, batch.id, &metadata).await;
            return Err(err.into());
        }

        info!(
            batch = %batch.batch_number,
            claims = batch.items.len(),
            %total,
            "Payment batch created"
        );
        Ok(batch)
    }

    pub async fn approve_batch(&self, id: PaymentBatchId, actor: &str) -> Result<PaymentBatch, BillingError> {
        let metadata = Some(OperationMetadata::for_user(actor));
        let mut batch = self.batches.get_batch(id, metadata.clone()).await?;
        batch.approve(actor)?;
        self.batches.update_batch(&batch, metadata).await?;
        Ok(batch)
    }

    pub async fn mark_paid(&self, id: PaymentBatchId, reference: &str, actor: &str) -> Result<PaymentBatch, BillingError> {
        let metadata = Some(OperationMetadata::for_user(actor));
        let mut batch = self.batches.get_batch(id, metadata.clone()).await?;
        batch.mark_paid(reference)?;
        self.batches.update_batch(&batch, metadata).await?;
        Ok(batch)
    }

    /// Cancels the batch and returns its claims to the payable pool
    ///
    /// If any claim cannot be released the batch keeps its status and the
    /// claims already released are stamped again.
    #[instrument(skip(self, reason), fields(batch_id = %id))]
    pub async fn cancel_batch(&self, id: PaymentBatchId, reason: &str, actor: &str) -> Result<PaymentBatch, BillingError> {
        let metadata = Some(OperationMetadata::for_user(actor));
        let mut batch = self.batches.get_batch(id, metadata.clone()).await?;
        batch.cancel(reason)?;

        let mut released = Vec::with_capacity(batch.items.len());
        for claim_id in batch.claim_ids() {
            match self.release_claim(claim_id, batch.id, &metadata).await {
                Ok(Some(claim)) => released.push(claim),
                Ok(None) => {}
                Err(err) => {
                    self.stamp_back(released, batch.id, &metadata).await;
                    return Err(err);
                }
            }
        }

        if let Err(err) = self.batches.update_batch(&batch, metadata.clone()).await {
            self.stamp_back(released, batch.id, &metadata).await;
            return Err(err.into());
        }
        Ok(batch)
    }

    /// Sum of batches awaiting approval or payment
    pub async fn outstanding_total(&self) -> Result<rust_decimal::Decimal, BillingError> {
        let mut total = rust_decimal::Decimal::ZERO;
        for status in [BatchStatus::Draft, BatchStatus::Approved] {
            for batch in self.batches.list_batches(Some(status), None).await? {
                total = total
                    .checked_add(batch.total()?.amount())
                    .ok_or(core_kernel::MoneyError::Overflow)?;
            }
        }
        Ok(total)
    }

    /// Stamps each claim with the batch, undoing earlier stamps on failure
    async fn stamp_claims(
        &self,
        claims: Vec<Claim>,
        batch_id: PaymentBatchId,
        metadata: &Option<OperationMetadata>,
    ) -> Result<Vec<Claim>, BillingError> {
        let mut stamped = Vec::with_capacity(claims.len());
        for mut claim in claims {
            let outcome = match claim.assign_to_batch(batch_id) {
                Ok(()) => self.claims.update_claim(&claim, metadata.clone()).await.map_err(BillingError::from),
                Err(err) => Err(err.into()),
            };
            if let Err(err) = outcome {
                self.unstamp_claims(stamped, batch_id, metadata).await;
                return Err(err);
            }
            stamped.push(claim);
        }
        Ok(stamped)
    }

    async fn unstamp_claims(&self, claims: Vec<Claim>, batch_id: PaymentBatchId, metadata: &Option<OperationMetadata>) {
        for mut claim in claims {
            claim.clear_batch(batch_id);
            if let Err(err) = self.claims.update_claim(&claim, metadata.clone()).await {
                error!(claim = %claim.claim_number, %batch_id, error = %err, "Could not release claim from failed batch");
            }
        }
    }

    async fn release_claim(
        &self,
        claim_id: ClaimId,
        batch_id: PaymentBatchId,
        metadata: &Option<OperationMetadata>,
    ) -> Result<Option<Claim>, BillingError> {
        let mut claim = self.claims.get_claim(claim_id, metadata.clone()).await?;
        if claim.batch_id != Some(batch_id) {
            return Ok(None);
        }
        claim.clear_batch(batch_id);
        self.claims.update_claim(&claim, metadata.clone()).await?;
        Ok(Some(claim))
    }

    async fn stamp_back(&self, claims: Vec<Claim>, batch_id: PaymentBatchId, metadata: &Option<OperationMetadata>) {
        for mut claim in claims {
            let outcome = match claim.assign_to_batch(batch_id) {
                Ok(()) => self.claims.update_claim(&claim, metadata.clone()).await.map_err(BillingError::from),
                Err(err) => Err(err.into()),
            };
            if let Err(err) = outcome {
                error!(claim = %claim.claim_number, %batch_id, error = %err, "Could not restore claim to batch");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::InMemoryPaymentBatchPort;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, Money, PortError, ProviderId};
    use domain_claims::{InMemoryClaimsPort, PaCode, PriorAuthorization, ServiceType};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_utils::{treatment, ClaimBuilder};

    fn approved_claim(provider_id: ProviderId, day: u32, price: rust_decimal::Decimal) -> Claim {
        ClaimBuilder::new()
            .at_provider(provider_id)
            .with_diagnosis(&["J06.9"])
            .on(NaiveDate::from_ymd_opt(2024, 6, day).unwrap())
            .with_treatments(vec![treatment(ServiceType::Consultation, "Consultation", 1, price)])
            .build_approved()
    }

    fn june() -> DateRange {
        DateRange::month_of(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    /// Claims port whose `fail_on`-th claim update (counting from 1) loses the connection
    #[derive(Clone)]
    struct FailingUpdates {
        inner: InMemoryClaimsPort,
        fail_on: usize,
        updates: Arc<AtomicUsize>,
    }

    impl FailingUpdates {
        fn new(inner: InMemoryClaimsPort, fail_on: usize) -> Self {
            Self {
                inner,
                fail_on,
                updates: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl DomainPort for FailingUpdates {}

    #[async_trait]
    impl HealthCheckable for FailingUpdates {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait]
    impl ClaimsPort for FailingUpdates {
        async fn get_claim(&self, id: ClaimId, metadata: Option<OperationMetadata>) -> Result<Claim, PortError> {
            self.inner.get_claim(id, metadata).await
        }

        async fn find_claims(&self, query: ClaimQuery, metadata: Option<OperationMetadata>) -> Result<Vec<Claim>, PortError> {
            self.inner.find_claims(query, metadata).await
        }

        async fn create_claim(&self, claim: &Claim, metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            self.inner.create_claim(claim, metadata).await
        }

        async fn update_claim(&self, claim: &Claim, metadata: Option<OperationMetadata>) -> Result<(), PortError> {
            if self.updates.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(PortError::connection("claims store unavailable"));
            }
            self.inner.update_claim(claim, metadata).await
        }

        async fn pa_code_exists(&self, code: &PaCode) -> Result<bool, PortError> {
            self.inner.pa_code_exists(code).await
        }

        async fn save_authorization(
            &self,
            authorization: &PriorAuthorization,
            metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.inner.save_authorization(authorization, metadata).await
        }

        async fn get_authorization_by_code(&self, code: &PaCode) -> Result<PriorAuthorization, PortError> {
            self.inner.get_authorization_by_code(code).await
        }

        async fn update_authorization(
            &self,
            authorization: &PriorAuthorization,
            metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.inner.update_authorization(authorization, metadata).await
        }
    }

    async fn three_june_claims() -> InMemoryClaimsPort {
        let provider = ProviderId::new_v7();
        InMemoryClaimsPort::with_claims(vec![
            approved_claim(provider, 3, dec!(7000)),
            approved_claim(provider, 12, dec!(2000)),
            approved_claim(provider, 28, dec!(3000)),
        ])
        .await
    }

    #[tokio::test]
    async fn test_create_then_cancel_releases_claims() {
        let provider = ProviderId::new_v7();
        let claims = InMemoryClaimsPort::with_claims(vec![
            approved_claim(provider, 3, dec!(7000)),
            approved_claim(provider, 28, dec!(3000)),
        ])
        .await;
        let batches = InMemoryPaymentBatchPort::new();
        let service = PaymentBatchService::new(Arc::new(batches.clone()), Arc::new(claims.clone()));

        let batch = service.create_batch(june(), "finance.tolu").await.unwrap();
        assert_eq!(batch.total().unwrap(), Money::ngn(dec!(10000)));
        assert!(batch.batch_number.starts_with("PB-202406-"));
        assert!(claims.find_claims(ClaimQuery::payable(), None).await.unwrap().is_empty());

        // Nothing left to batch
        assert!(matches!(
            service.create_batch(june(), "finance.tolu").await,
            Err(BillingError::NoPayableClaims { .. })
        ));

        service.cancel_batch(batch.id, "wrong period", "finance.tolu").await.unwrap();
        assert_eq!(claims.find_claims(ClaimQuery::payable(), None).await.unwrap().len(), 2);
        assert_eq!(service.outstanding_total().await.unwrap(), dec!(0));
    }

    #[tokio::test]
    async fn test_failed_stamp_leaves_no_batch_and_claims_payable() {
        let store = three_june_claims().await;
        let claims = FailingUpdates::new(store.clone(), 2);
        let batches = InMemoryPaymentBatchPort::new();
        let service = PaymentBatchService::new(Arc::new(batches.clone()), Arc::new(claims));

        let err = service.create_batch(june(), "finance.tolu").await.unwrap_err();
        assert!(matches!(err, BillingError::Port(PortError::Connection { .. })));
        assert!(batches.list_batches(None, None).await.unwrap().is_empty());
        assert_eq!(store.find_claims(ClaimQuery::payable(), None).await.unwrap().len(), 3);

        // A retry batches each claim exactly once
        let batch = service.create_batch(june(), "finance.tolu").await.unwrap();
        assert_eq!(batch.items.len(), 3);
        assert_eq!(batch.total().unwrap(), Money::ngn(dec!(12000)));
        assert!(store.find_claims(ClaimQuery::payable(), None).await.unwrap().is_empty());
        assert_eq!(batches.list_batches(None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_release_keeps_batch_and_its_claims() {
        let store = three_june_claims().await;
        // Updates 1-3 stamp the claims; update 5 fails while cancelling
        let claims = FailingUpdates::new(store.clone(), 5);
        let batches = InMemoryPaymentBatchPort::new();
        let service = PaymentBatchService::new(Arc::new(batches.clone()), Arc::new(claims));

        let batch = service.create_batch(june(), "finance.tolu").await.unwrap();
        let err = service.cancel_batch(batch.id, "duplicate run", "finance.tolu").await.unwrap_err();
        assert!(matches!(err, BillingError::Port(PortError::Connection { .. })));

        let stored = batches.get_batch(batch.id, None).await.unwrap();
        assert_eq!(stored.status, BatchStatus::Draft);
        for claim_id in stored.claim_ids() {
            assert_eq!(store.get_claim(claim_id, None).await.unwrap().batch_id, Some(batch.id));
        }

        let cancelled = service.cancel_batch(batch.id, "duplicate run", "finance.tolu").await.unwrap();
        assert_eq!(cancelled.status, BatchStatus::Cancelled);
        assert_eq!(store.find_claims(ClaimQuery::payable(), None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_four_eyes_approval_and_payment() {
        let claims = InMemoryClaimsPort::with_claims(vec![approved_claim(ProviderId::new_v7(), 10, dec!(4500))]).await;
        let service = PaymentBatchService::new(Arc::new(InMemoryPaymentBatchPort::new()), Arc::new(claims));

        let batch = service.create_batch(june(), "finance.tolu").await.unwrap();
        assert!(matches!(
            service.approve_batch(batch.id, "finance.tolu").await,
            Err(BillingError::SelfApproval(_))
        ));
        assert_eq!(service.outstanding_total().await.unwrap(), dec!(4500));

        service.approve_batch(batch.id, "finance.manager").await.unwrap();
        let paid = service.mark_paid(batch.id, "NIP/2024/000123", "finance.manager").await.unwrap();
        assert_eq!(paid.status, BatchStatus::Paid);
        assert_eq!(paid.paid_reference.as_deref(), Some("NIP/2024/000123"));
    }
}
