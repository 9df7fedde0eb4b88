//! Claims Domain Ports
//!
//! `ClaimsPort` persists claims and the prior authorizations they quote.
//! Both live behind one port because submitting a claim consumes its PA code,
//! and adapters are expected to store the two together.
//!
//! - **Internal Adapter**: PostgreSQL (`infra_db::adapters::PostgresClaimsAdapter`)
//! - **In-memory Adapter**: [`mock::InMemoryClaimsPort`]

use async_trait::async_trait;

use core_kernel::{
    ClaimId, DomainPort, EnrolleeId, HealthCheckable, OperationMetadata, PortError, ProviderId,
};

use crate::authorization::{PaCode, PriorAuthorization};
use crate::claim::Claim;
use crate::vetting::VettingStage;

/// Query parameters for finding claims
#[derive(Debug, Clone, Default)]
pub struct ClaimQuery {
    pub stage: Option<VettingStage>,
    pub provider_id: Option<ProviderId>,
    pub enrollee_id: Option<EnrolleeId>,
    /// Only approved claims that are not yet in a payment batch
    pub unbatched_only: bool,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ClaimQuery {
    pub fn in_stage(stage: VettingStage) -> Self {
        Self {
            stage: Some(stage),
            ..Default::default()
        }
    }

    /// Approved claims waiting to be batched for payment
    pub fn payable() -> Self {
        Self {
            stage: Some(VettingStage::Approved),
            unbatched_only: true,
            ..Default::default()
        }
    }

    pub fn for_provider(provider_id: ProviderId) -> Self {
        Self {
            provider_id: Some(provider_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, claim: &Claim) -> bool {
        self.stage.map_or(true, |s| claim.stage == s)
            && self.provider_id.map_or(true, |p| claim.provider_id == p)
            && self.enrollee_id.map_or(true, |e| claim.enrollee_id == e)
            && (!self.unbatched_only || claim.is_payable())
    }
}

/// Storage port for claims and prior authorizations
///
/// Results of `find_claims` are ordered oldest first.
#[async_trait]
pub trait ClaimsPort: DomainPort + HealthCheckable {
    async fn get_claim(
        &self,
        id: ClaimId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Claim, PortError>;

    async fn find_claims(
        &self,
        query: ClaimQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Claim>, PortError>;

    async fn create_claim(
        &self,
        claim: &Claim,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    async fn update_claim(
        &self,
        claim: &Claim,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    async fn pa_code_exists(&self, code: &PaCode) -> Result<bool, PortError>;

    /// Stores a newly issued authorization; `PortError::Conflict` if the code is taken
    async fn save_authorization(
        &self,
        authorization: &PriorAuthorization,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    async fn get_authorization_by_code(&self, code: &PaCode) -> Result<PriorAuthorization, PortError>;

    async fn update_authorization(
        &self,
        authorization: &PriorAuthorization,
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

    #[derive(Debug, Default)]
    struct Store {
        claims: HashMap<ClaimId, Claim>,
        authorizations: HashMap<PaCode, PriorAuthorization>,
    }

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryClaimsPort {
        store: Arc<RwLock<Store>>,
    }

    impl InMemoryClaimsPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_claims(claims: Vec<Claim>) -> Self {
            let port = Self::new();
            {
                let mut store = port.store.write().await;
                for claim in claims {
                    store.claims.insert(claim.id, claim);
                }
            }
            port
        }

        pub async fn authorization_count(&self) -> usize {
            self.store.read().await.authorizations.len()
        }
    }

    impl DomainPort for InMemoryClaimsPort {}

    #[async_trait]
    impl HealthCheckable for InMemoryClaimsPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-claims-port")
        }
    }

    #[async_trait]
    impl ClaimsPort for InMemoryClaimsPort {
        async fn get_claim(
            &self,
            id: ClaimId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Claim, PortError> {
            self.store
                .read()
                .await
                .claims
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn find_claims(
            &self,
            query: ClaimQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Claim>, PortError> {
            let store = self.store.read().await;
            let mut results: Vec<Claim> = store
                .claims
                .values()
                .filter(|c| query.matches(c))
                .cloned()
                .collect();
            results.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
            Ok(results.into_iter().skip(offset).take(limit).collect())
        }

        async fn create_claim(
            &self,
            claim: &Claim,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut store = self.store.write().await;
            if store.claims.contains_key(&claim.id)
                || store.claims.values().any(|c| c.claim_number == claim.claim_number)
            {
                return Err(PortError::conflict(format!("claim {} already exists", claim.claim_number)));
            }
            store.claims.insert(claim.id, claim.clone());
            Ok(())
        }

        async fn update_claim(
            &self,
            claim: &Claim,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut store = self.store.write().await;
            match store.claims.get_mut(&claim.id) {
                Some(existing) => {
                    *existing = claim.clone();
                    Ok(())
                }
                None => Err(PortError::not_found("Claim", claim.id)),
            }
        }

        async fn pa_code_exists(&self, code: &PaCode) -> Result<bool, PortError> {
            Ok(self.store.read().await.authorizations.contains_key(code))
        }

        async fn save_authorization(
            &self,
            authorization: &PriorAuthorization,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut store = self.store.write().await;
            if store.authorizations.contains_key(&authorization.code) {
                return Err(PortError::conflict(format!(
                    "PA code {} already issued",
                    authorization.code
                )));
            }
            store
                .authorizations
                .insert(authorization.code.clone(), authorization.clone());
            Ok(())
        }

        async fn get_authorization_by_code(&self, code: &PaCode) -> Result<PriorAuthorization, PortError> {
            self.store
                .read()
                .await
                .authorizations
                .get(code)
                .cloned()
                .ok_or_else(|| PortError::not_found("PriorAuthorization", code))
        }

        async fn update_authorization(
            &self,
            authorization: &PriorAuthorization,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut store = self.store.write().await;
            match store.authorizations.get_mut(&authorization.code) {
                Some(existing) => {
                    *existing = authorization.clone();
                    Ok(())
                }
                None => Err(PortError::not_found("PriorAuthorization", &authorization.code)),
            }
        }
    }
}
