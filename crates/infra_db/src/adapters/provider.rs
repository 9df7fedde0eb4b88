//! PostgreSQL Provider Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError, ProviderId,
};
use domain_provider::{Provider, ProviderPort, ProviderQuery};

use super::{convert_rows, ping};
use crate::repositories::ProviderRepository;

#[derive(Debug, Clone)]
pub struct PostgresProviderAdapter {
    repository: ProviderRepository,
    pool: PgPool,
}

impl PostgresProviderAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ProviderRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresProviderAdapter {}

#[async_trait]
impl HealthCheckable for PostgresProviderAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-provider-adapter").await
    }
}

#[async_trait]
impl ProviderPort for PostgresProviderAdapter {
    #[instrument(skip(self, _metadata), fields(provider_id = %id))]
    async fn get_provider(
        &self,
        id: ProviderId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Provider, PortError> {
        debug!("Fetching provider by ID");
        let row = self.repository.get_by_id(id.into()).await?;
        Ok(Provider::try_from(row)?)
    }

    #[instrument(skip(self, _metadata))]
    async fn find_providers(
        &self,
        query: ProviderQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Provider>, PortError> {
        convert_rows(self.repository.find(&query).await?)
    }

    #[instrument(skip(self, provider, _metadata), fields(provider_code = %provider.provider_code))]
    async fn create_provider(
        &self,
        provider: &Provider,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.repository.insert(provider).await?;
        Ok(())
    }

    #[instrument(skip(self, provider, _metadata), fields(provider_id = %provider.id))]
    async fn update_provider(
        &self,
        provider: &Provider,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.repository.update(provider).await?;
        Ok(())
    }
}
