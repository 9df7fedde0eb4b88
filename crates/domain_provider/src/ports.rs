//! Provider Domain Ports
//!
//! - **Internal Adapter**: PostgreSQL (`infra_db::adapters::PostgresProviderAdapter`)
//! - **In-memory Adapter**: [`mock::InMemoryProviderPort`]

use async_trait::async_trait;
use chrono::NaiveDate;

use core_kernel::{DomainPort, HealthCheckable, OperationMetadata, PortError, ProviderId};

use crate::provider::{Provider, ProviderCategory, ProviderStatus, ProviderTier};

/// Query parameters for finding providers
#[derive(Debug, Clone, Default)]
pub struct ProviderQuery {
    pub tier: Option<ProviderTier>,
    pub category: Option<ProviderCategory>,
    pub status: Option<ProviderStatus>,
    /// Only providers whose contract covers this date
    pub contracted_on: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ProviderQuery {
    pub fn by_tier(tier: ProviderTier) -> Self {
        Self {
            tier: Some(tier),
            ..Default::default()
        }
    }

    pub fn contracted_on(date: NaiveDate) -> Self {
        Self {
            contracted_on: Some(date),
            ..Default::default()
        }
    }

    pub fn matches(&self, provider: &Provider) -> bool {
        self.tier.map_or(true, |t| provider.tier == t)
            && self.category.map_or(true, |c| provider.category == c)
            && self.status.map_or(true, |s| provider.status == s)
            && self.contracted_on.map_or(true, |d| provider.contract.contains(d))
    }
}

/// Storage port for the provider network
///
/// Results of `find_providers` are ordered by name.
#[async_trait]
pub trait ProviderPort: DomainPort + HealthCheckable {
    async fn get_provider(
        &self,
        id: ProviderId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Provider, PortError>;

    async fn find_providers(
        &self,
        query: ProviderQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Provider>, PortError>;

    /// Returns `PortError::Conflict` if the provider code is already taken
    async fn create_provider(
        &self,
        provider: &Provider,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    async fn update_provider(
        &self,
        provider: &Provider,
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
    pub struct InMemoryProviderPort {
        providers: Arc<RwLock<HashMap<ProviderId, Provider>>>,
    }

    impl InMemoryProviderPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_providers(providers: Vec<Provider>) -> Self {
            let port = Self::new();
            {
                let mut store = port.providers.write().await;
                for provider in providers {
                    store.insert(provider.id, provider);
                }
            }
            port
        }
    }

    impl DomainPort for InMemoryProviderPort {}

    #[async_trait]
    impl HealthCheckable for InMemoryProviderPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-provider-port")
        }
    }

    #[async_trait]
    impl ProviderPort for InMemoryProviderPort {
        async fn get_provider(
            &self,
            id: ProviderId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Provider, PortError> {
            self.providers
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Provider", id))
        }

        async fn find_providers(
            &self,
            query: ProviderQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Provider>, PortError> {
            let store = self.providers.read().await;
            let mut results: Vec<Provider> = store
                .values()
                .filter(|p| query.matches(p))
                .cloned()
                .collect();
            results.sort_by(|a, b| a.name.cmp(&b.name));

            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
            Ok(results.into_iter().skip(offset).take(limit).collect())
        }

        async fn create_provider(
            &self,
            provider: &Provider,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut store = self.providers.write().await;
            if store.contains_key(&provider.id) {
                return Err(PortError::conflict(format!("provider {} already exists", provider.id)));
            }
            if store.values().any(|p| p.provider_code == provider.provider_code) {
                return Err(PortError::conflict(format!(
                    "provider code {} already exists",
                    provider.provider_code
                )));
            }
            store.insert(provider.id, provider.clone());
            Ok(())
        }

        async fn update_provider(
            &self,
            provider: &Provider,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut store = self.providers.write().await;
            match store.get_mut(&provider.id) {
                Some(existing) => {
                    *existing = provider.clone();
                    Ok(())
                }
                None => Err(PortError::not_found("Provider", provider.id)),
            }
        }
    }
}
