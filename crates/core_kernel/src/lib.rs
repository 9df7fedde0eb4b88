//! Core Kernel - Foundational types for the HMO administration system
//!
//! This crate provides the building blocks shared by every domain crate:
//! - Money types with precise decimal arithmetic
//! - Calendar helpers (date ranges, age calculation)
//! - Strongly-typed identifiers
//! - Port error and health types for the hexagonal adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{DateRange, TemporalError, age_on, parse_flexible_date};
pub use identifiers::{
    EnrolleeId, ProviderId, ClaimId, TreatmentLineId,
    AuthorizationId, PaymentBatchId, UploadId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult,
    AdapterHealth, OperationMetadata,
};
