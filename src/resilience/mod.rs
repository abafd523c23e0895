//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Refresh after a confirmed transaction:
//!     → retries.rs (retry ReadFailed within a budget)
//!     → backoff.rs (exponential delay + jitter between attempts)
//! ```
//!
//! # Design Decisions
//! - Every RPC call already has a deadline (ledger timeouts)
//! - Retries only for reads; writes are never resubmitted
//! - Jittered backoff keeps concurrent refreshes from retrying in lockstep

pub mod backoff;
pub mod retries;

pub use backoff::{calculate_backoff, RetryPolicy};
pub use retries::retry_with_backoff;
