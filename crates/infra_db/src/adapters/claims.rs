//! PostgreSQL Claims Adapter
//!
//! Serves both claims and prior authorizations, which share the claims port.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    ClaimId, DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError,
};
use domain_claims::{Claim, ClaimQuery, ClaimsPort, PaCode, PriorAuthorization};

use super::{convert_rows, ping};
use crate::repositories::{AuthorizationRepository, ClaimsRepository};

#[derive(Debug, Clone)]
pub struct PostgresClaimsAdapter {
    claims: ClaimsRepository,
    authorizations: AuthorizationRepository,
    pool: PgPool,
}

impl PostgresClaimsAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            claims: ClaimsRepository::new(pool.clone()),
            authorizations: AuthorizationRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresClaimsAdapter {}

#[async_trait]
impl HealthCheckable for PostgresClaimsAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-claims-adapter").await
    }
}

#[async_trait]
impl ClaimsPort for PostgresClaimsAdapter {
    #[instrument(skip(self, _metadata), fields(claim_id = %id))]
    async fn get_claim(
        &self,
        id: ClaimId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Claim, PortError> {
        debug!("Fetching claim by ID");
        let row = self.claims.get_by_id(id.into()).await?;
        Ok(Claim::try_from(row)?)
    }

    #[instrument(skip(self, _metadata))]
    async fn find_claims(
        &self,
        query: ClaimQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Claim>, PortError> {
        convert_rows(self.claims.find(&query).await?)
    }

    #[instrument(skip(self, claim, _metadata), fields(claim_number = %claim.claim_number))]
    async fn create_claim(
        &self,
        claim: &Claim,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.claims.insert(claim).await?;
        Ok(())
    }

    #[instrument(skip(self, claim, _metadata), fields(claim_number = %claim.claim_number, stage = %claim.stage))]
    async fn update_claim(
        &self,
        claim: &Claim,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.claims.update(claim).await?;
        Ok(())
    }

    async fn pa_code_exists(&self, code: &PaCode) -> Result<bool, PortError> {
        Ok(self.authorizations.code_exists(code).await?)
    }

    #[instrument(skip(self, authorization, _metadata), fields(pa_code = %authorization.code))]
    async fn save_authorization(
        &self,
        authorization: &PriorAuthorization,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.authorizations.insert(authorization).await?;
        Ok(())
    }

    async fn get_authorization_by_code(&self, code: &PaCode) -> Result<PriorAuthorization, PortError> {
        let row = self.authorizations.get_by_code(code).await?;
        Ok(PriorAuthorization::try_from(row)?)
    }

    #[instrument(skip(self, authorization, _metadata), fields(pa_code = %authorization.code))]
    async fn update_authorization(
        &self,
        authorization: &PriorAuthorization,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        self.authorizations.update(authorization).await?;
        Ok(())
    }
}
