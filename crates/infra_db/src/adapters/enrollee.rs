//! PostgreSQL Enrollee Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    DomainPort, EnrolleeId, HealthCheckResult, HealthCheckable, OperationMetadata, PortError,
};
use domain_enrollment::{Enrollee, EnrolleePort, EnrolleeQuery};

use super::{convert_rows, ping};
use crate::repositories::EnrolleeRepository;

/// PostgreSQL-backed implementation of [`EnrolleePort`]
///
/// Unique violations on membership or NHIA numbers surface as
/// `PortError::Conflict`; a failed bulk insert leaves nothing behind.
#[derive(Debug, Clone)]
pub struct PostgresEnrolleeAdapter {
    repository: EnrolleeRepository,
    pool: PgPool,
}

impl PostgresEnrolleeAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: EnrolleeRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &EnrolleeRepository {
        &self.repository
    }
}

impl DomainPort for PostgresEnrolleeAdapter {}

#[async_trait]
impl HealthCheckable for PostgresEnrolleeAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-enrollee-adapter").await
    }
}

#[async_trait]
impl EnrolleePort for PostgresEnrolleeAdapter {
    #[instrument(skip(self, _metadata), fields(enrollee_id = %id))]
    async fn get_enrollee(
        &self,
        id: EnrolleeId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Enrollee, PortError> {
        debug!("Fetching enrollee by ID");
        let row = self.repository.get_by_id(id.into()).await?;
        Ok(Enrollee::try_from(row)?)
    }

    #[instrument(skip(self, _metadata))]
    async fn find_enrollees(
        &self,
        query: EnrolleeQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Enrollee>, PortError> {
        let rows = self.repository.find(&query).await?;
        convert_rows(rows)
    }

    #[instrument(skip(self, enrollee, _metadata), fields(enrollee_number = %enrollee.enrollee_number))]
    async fn create_enrollee(
        &self,
        enrollee: &Enrollee,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.repository.insert_all(std::slice::from_ref(enrollee)).await?;
        Ok(())
    }

    #[instrument(skip(self, enrollees, _metadata), fields(count = enrollees.len()))]
    async fn create_enrollees(
        &self,
        enrollees: &[Enrollee],
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.repository.insert_all(enrollees).await?;
        debug!("Bulk enrollment committed");
        Ok(())
    }

    #[instrument(skip(self, enrollee, _metadata), fields(enrollee_id = %enrollee.id))]
    async fn update_enrollee(
        &self,
        enrollee: &Enrollee,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.repository.update(enrollee).await?;
        Ok(())
    }

    async fn nhia_number_exists(&self, nhia_number: &str) -> Result<bool, PortError> {
        Ok(self.repository.nhia_number_exists(nhia_number).await?)
    }
}
