//! Request and response bodies
//!
//! Responses flatten domain types into plain JSON: identifiers are bare
//! UUIDs and money is split into an amount and a currency code.

pub mod enrollment;
pub mod providers;
pub mod claims;
pub mod billing;

/// Default page size when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 500;

/// Resolves a `?limit=` parameter against the default and the cap
pub fn page_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
}
