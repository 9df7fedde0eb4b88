//! Repository implementations for domain entities
//!
//! Repositories own the SQL. Each one maps between a `FromRow` row type and
//! the domain aggregate it stores; enumerations are kept as snake_case text
//! and nested collections (treatment lines, batch items, stage history) as
//! JSONB.

pub mod enrollee;
pub mod provider;
pub mod claims;
pub mod authorization;
pub mod batch;

pub use enrollee::EnrolleeRepository;
pub use provider::ProviderRepository;
pub use claims::ClaimsRepository;
pub use authorization::AuthorizationRepository;
pub use batch::PaymentBatchRepository;

use std::fmt::Display;
use std::str::FromStr;

use crate::error::DatabaseError;

/// Parses a text column back into its domain type
pub(crate) fn parse_column<T>(column: &'static str, raw: &str) -> Result<T, DatabaseError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>().map_err(|e| DatabaseError::decode(column, e))
}

/// Converts an optional page size or offset into a SQL bound
pub(crate) fn page_bound(value: Option<u32>, default: i64) -> i64 {
    value.map(i64::from).unwrap_or(default)
}
