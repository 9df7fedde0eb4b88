//! Billing Domain - Provider Payment Batches
//!
//! Approved claims are paid to providers in batches. A batch covers a period
//! (usually a calendar month), lists every payable claim with its approved
//! amount, and carries the totals owed to each provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{PaymentBatch, PaymentBatchService};
//! use core_kernel::DateRange;
//!
//! let period = DateRange::month_of(today);
//! let batch = service.create_batch(period, "finance.officer").await?;
//! service.approve_batch(batch.id, "finance.manager").await?;
//! service.mark_paid(batch.id, "NIP/2024/000123", "finance.manager").await?;
//! ```

pub mod batch;
pub mod service;
pub mod error;
pub mod ports;

pub use batch::{BatchItem, BatchStatus, PaymentBatch, ProviderSummary};
pub use service::PaymentBatchService;
pub use error::BillingError;
pub use ports::PaymentBatchPort;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryPaymentBatchPort;
