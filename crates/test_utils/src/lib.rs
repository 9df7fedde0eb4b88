//! Shared test support for the HMO workspace
//!
//! - [`fixtures`]: fixed dates, amounts and sample uploads
//! - [`builders`]: enrollees, providers and claims with fake personal data
//! - [`generators`]: proptest strategies for money and treatment lines
//! - [`assertions`]: domain-aware assertions

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
