//! Transaction orchestrator.
//!
//! # Data Flow
//! ```text
//! Contract client write
//!     → transaction.rs (PendingTransaction, Submitted)
//!     → confirm.rs (receipt polling, depth, timeout)
//!     → executor.rs (terminal state, metrics, refresh on confirmation)
//!     → View State (via the caller's refresh)
//! ```

pub mod confirm;
pub mod executor;
pub mod transaction;

pub use confirm::{wait_for_confirmation, ConfirmationPolicy, WaitOutcome};
pub use executor::{Confirmation, TxOrchestrator};
pub use transaction::{submit_transaction, Action, PendingTransaction, TxState};
