//! Enrollment Domain Ports
//!
//! The `EnrolleePort` trait is everything the enrollment screens need from
//! storage: look up members, search them, register them one at a time or in
//! bulk, and persist changes.
//!
//! - **Internal Adapter**: PostgreSQL (`infra_db::adapters::PostgresEnrolleeAdapter`)
//! - **In-memory Adapter**: [`mock::InMemoryEnrolleePort`] for tests and demo mode
//!
//! ```rust,ignore
//! let port: Arc<dyn EnrolleePort> = Arc::new(PostgresEnrolleeAdapter::new(pool));
//! let enrollee = port.get_enrollee(id, None).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, EnrolleeId, HealthCheckable, OperationMetadata, PortError};

use crate::enrollee::{Enrollee, EnrolleeStatus};
use crate::plan::PlanTier;

/// Query parameters for finding enrollees
#[derive(Debug, Clone, Default)]
pub struct EnrolleeQuery {
    pub status: Option<EnrolleeStatus>,
    pub plan: Option<PlanTier>,
    /// Case-insensitive match against name, enrollee number and NHIA number
    pub search: Option<String>,
    pub employer: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl EnrolleeQuery {
    pub fn by_status(status: EnrolleeStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Returns true if `enrollee` satisfies every filter in this query
    pub fn matches(&self, enrollee: &Enrollee) -> bool {
        if let Some(status) = self.status {
            if enrollee.status != status {
                return false;
            }
        }
        if let Some(plan) = self.plan {
            if enrollee.plan != plan {
                return false;
            }
        }
        if let Some(ref employer) = self.employer {
            let matches_employer = enrollee
                .employer
                .as_ref()
                .map(|e| e.eq_ignore_ascii_case(employer))
                .unwrap_or(false);
            if !matches_employer {
                return false;
            }
        }
        if let Some(ref text) = self.search {
            let needle = text.to_ascii_lowercase();
            let haystacks = [
                Some(enrollee.full_name()),
                Some(enrollee.enrollee_number.clone()),
                enrollee.nhia_number.clone(),
            ];
            let found = haystacks
                .iter()
                .flatten()
                .any(|h| h.to_ascii_lowercase().contains(&needle));
            if !found {
                return false;
            }
        }
        true
    }
}

/// The main port trait for enrollment data
///
/// Results of `find_enrollees` are ordered by enrollee number.
#[async_trait]
pub trait EnrolleePort: DomainPort + HealthCheckable {
    /// Retrieves an enrollee by ID, or `PortError::NotFound`
    async fn get_enrollee(
        &self,
        id: EnrolleeId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Enrollee, PortError>;

    async fn find_enrollees(
        &self,
        query: EnrolleeQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Enrollee>, PortError>;

    /// Persists a newly registered enrollee
    ///
    /// Returns `PortError::Conflict` if the NHIA number or enrollee number is taken.
    async fn create_enrollee(
        &self,
        enrollee: &Enrollee,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Persists a batch of enrollees atomically; nothing is stored if any row conflicts
    async fn create_enrollees(
        &self,
        enrollees: &[Enrollee],
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Overwrites the stored record with `enrollee`
    async fn update_enrollee(
        &self,
        enrollee: &Enrollee,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    async fn nhia_number_exists(&self, nhia_number: &str) -> Result<bool, PortError>;
}

/// In-memory implementation for tests and demo mode
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryEnrolleePort {
        enrollees: Arc<RwLock<HashMap<EnrolleeId, Enrollee>>>,
    }

    impl InMemoryEnrolleePort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with enrollees for testing
        pub async fn with_enrollees(enrollees: Vec<Enrollee>) -> Self {
            let port = Self::new();
            {
                let mut store = port.enrollees.write().await;
                for enrollee in enrollees {
                    store.insert(enrollee.id, enrollee);
                }
            }
            port
        }

        fn conflict_with(existing: &Enrollee, candidate: &Enrollee) -> Option<PortError> {
            if existing.id == candidate.id {
                return Some(PortError::conflict(format!("enrollee {} already exists", candidate.id)));
            }
            if existing.enrollee_number == candidate.enrollee_number {
                return Some(PortError::conflict(format!(
                    "enrollee number {} already exists",
                    candidate.enrollee_number
                )));
            }
            match (&existing.nhia_number, &candidate.nhia_number) {
                (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => {
                    Some(PortError::conflict(format!("NHIA number {} already registered", b)))
                }
                _ => None,
            }
        }
    }

    impl DomainPort for InMemoryEnrolleePort {}

    #[async_trait]
    impl HealthCheckable for InMemoryEnrolleePort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-enrollee-port")
        }
    }

    #[async_trait]
    impl EnrolleePort for InMemoryEnrolleePort {
        async fn get_enrollee(
            &self,
            id: EnrolleeId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Enrollee, PortError> {
            self.enrollees
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Enrollee", id))
        }

        async fn find_enrollees(
            &self,
            query: EnrolleeQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Enrollee>, PortError> {
            let store = self.enrollees.read().await;
            let mut results: Vec<Enrollee> = store
                .values()
                .filter(|e| query.matches(e))
                .cloned()
                .collect();
            results.sort_by(|a, b| a.enrollee_number.cmp(&b.enrollee_number));

            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
            Ok(results.into_iter().skip(offset).take(limit).collect())
        }

        async fn create_enrollee(
            &self,
            enrollee: &Enrollee,
            metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.create_enrollees(std::slice::from_ref(enrollee), metadata).await
        }

        async fn create_enrollees(
            &self,
            enrollees: &[Enrollee],
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut store = self.enrollees.write().await;
            for (i, candidate) in enrollees.iter().enumerate() {
                let clash = store
                    .values()
                    .chain(enrollees[..i].iter())
                    .find_map(|existing| Self::conflict_with(existing, candidate));
                if let Some(err) = clash {
                    return Err(err);
                }
            }
            for enrollee in enrollees {
                store.insert(enrollee.id, enrollee.clone());
            }
            Ok(())
        }

        async fn update_enrollee(
            &self,
            enrollee: &Enrollee,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let mut store = self.enrollees.write().await;
            match store.get_mut(&enrollee.id) {
                Some(existing) => {
                    *existing = enrollee.clone();
                    Ok(())
                }
                None => Err(PortError::not_found("Enrollee", enrollee.id)),
            }
        }

        async fn nhia_number_exists(&self, nhia_number: &str) -> Result<bool, PortError> {
            Ok(self
                .enrollees
                .read()
                .await
                .values()
                .any(|e| e.nhia_number.as_deref().map(|n| n.eq_ignore_ascii_case(nhia_number)).unwrap_or(false)))
        }
    }
}
