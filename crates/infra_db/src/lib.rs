//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the HMO domains using SQLx runtime queries.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: repositories own the SQL and
//! row types, adapters implement the domain ports on top of them.
//!
//! ```text
//! domain port  <--  adapters::Postgres*Adapter  -->  repositories::*Repository  -->  PgPool
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresEnrolleeAdapter;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/hmo")).await?;
//! run_migrations(&pool).await?;
//! let enrollees = PostgresEnrolleeAdapter::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
