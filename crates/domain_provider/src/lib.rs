//! Provider Network Domain
//!
//! Hospitals, clinics, pharmacies and other facilities that treat enrollees
//! and are paid through claims. Each provider sits in a referral tier, has a
//! category of service, and holds a contract period; claims are only accepted
//! for encounters that fall inside an active contract.
//!
//! # Examples
//!
//! ```rust
//! use domain_provider::{NewProvider, Provider, ProviderCategory, ProviderTier};
//! use chrono::NaiveDate;
//!
//! let provider = Provider::new(NewProvider {
//!     name: "Lagoon Hospital Ikoyi".to_string(),
//!     tier: ProviderTier::Tertiary,
//!     category: ProviderCategory::Hospital,
//!     contract_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     contract_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
//!     contact_email: None,
//!     contact_phone: None,
//!     address: None,
//!     bank_details: None,
//! })
//! .unwrap();
//!
//! assert!(provider.provider_code.starts_with("PRV-T-"));
//! assert!(provider.is_contracted_on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
//! ```

pub mod provider;
pub mod error;
pub mod ports;

pub use provider::{
    BankDetails, NewProvider, Provider, ProviderCategory, ProviderStatus, ProviderTier,
};
pub use error::ProviderError;
pub use ports::{ProviderPort, ProviderQuery};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryProviderPort;
