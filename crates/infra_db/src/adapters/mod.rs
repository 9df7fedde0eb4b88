//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter:
//! - Implements the domain's port trait
//! - Translates between domain models and repository row types
//! - Reports database reachability through `HealthCheckable`
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use infra_db::adapters::PostgresClaimsAdapter;
//! use domain_claims::ClaimsPort;
//!
//! let port: Arc<dyn ClaimsPort> = Arc::new(PostgresClaimsAdapter::new(pool));
//! let claim = port.get_claim(claim_id, None).await?;
//! ```

pub mod enrollee;
pub mod provider;
pub mod claims;
pub mod billing;

pub use enrollee::PostgresEnrolleeAdapter;
pub use provider::PostgresProviderAdapter;
pub use claims::PostgresClaimsAdapter;
pub use billing::PostgresPaymentBatchAdapter;

use chrono::Utc;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, HealthCheckResult, PortError};

use crate::error::DatabaseError;

/// Runs `SELECT 1` and reports latency under the given adapter id
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await;

    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };
    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}

/// Converts a batch of rows, failing on the first undecodable one
pub(crate) fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, PortError>
where
    T: TryFrom<R, Error = DatabaseError>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map_err(PortError::from))
        .collect()
}
