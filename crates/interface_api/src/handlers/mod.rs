//! Route handlers, one module per resource

pub mod health;
pub mod enrollment;
pub mod providers;
pub mod claims;
pub mod billing;
pub mod dashboard;
