//! Errors surfaced to the user of the façade.
//!
//! Every variant is recoverable: the session stays usable and the action
//! can be retried.

use alloy::primitives::TxHash;
use thiserror::Error;

use crate::orchestrator::Action;
use crate::wallet::WalletError;

#[derive(Debug, Error)]
pub enum EhrError {
    /// No wallet provider is installed.
    #[error("No wallet provider found; set the wallet private key environment variable")]
    NoProviderFound,

    /// Authorization or a transaction signature was declined.
    #[error("User rejected {action}")]
    UserRejected { action: String },

    /// Malformed input caught before anything was sent.
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Invalid contract address '{0}'")]
    InvalidAddress(String),

    /// The wallet could not report its authorized accounts.
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// No authorized account is available to sign with.
    #[error("No authorized account available to sign")]
    SignerUnavailable,

    /// The interface descriptor lacks methods the client calls.
    #[error("Contract interface is missing: {}", .0.join(", "))]
    InterfaceMismatch(Vec<String>),

    /// The ledger or node reported the transaction as failed.
    #[error("{action} reverted: {reason}")]
    TransactionReverted { action: Action, reason: String },

    #[error("{action} not confirmed within {waited_secs}s (tx {tx_hash})")]
    TransactionTimedOut {
        action: Action,
        tx_hash: TxHash,
        waited_secs: u64,
    },

    /// Broadcast failed for a reason other than a rejection or revert.
    #[error("{action} could not be submitted: {reason}")]
    SubmissionFailed { action: Action, reason: String },

    #[error("Reading {query} failed: {reason}")]
    ReadFailed { query: &'static str, reason: String },

    /// Shutdown was requested before the action was signed; nothing was sent.
    #[error("Not submitting {action}: shutting down")]
    ShuttingDown { action: Action },

    /// The wait was abandoned; the transaction itself may still land.
    #[error("Stopped waiting for {action} (tx {tx_hash})")]
    Abandoned { action: Action, tx_hash: TxHash },

    #[error("Artifact error: {0}")]
    Artifact(String),
}

impl EhrError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Map a wallet failure raised while submitting `action`.
    pub fn from_wallet(action: Action, error: WalletError) -> Self {
        match error {
            WalletError::UserRejected(what) => Self::UserRejected {
                action: format!("{} ({})", action, what),
            },
            WalletError::Reverted(reason) => Self::TransactionReverted { action, reason },
            WalletError::Unauthorized(_) => Self::SignerUnavailable,
            other => Self::SubmissionFailed {
                action,
                reason: other.to_string(),
            },
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoProviderFound => "no_provider",
            Self::UserRejected { .. } => "user_rejected",
            Self::InvalidInput { .. } => "invalid_input",
            Self::InvalidAddress(_) => "invalid_address",
            Self::WalletUnavailable(_) => "wallet_unavailable",
            Self::SignerUnavailable => "signer_unavailable",
            Self::InterfaceMismatch(_) => "interface_mismatch",
            Self::TransactionReverted { .. } => "reverted",
            Self::TransactionTimedOut { .. } => "timed_out",
            Self::SubmissionFailed { .. } => "submission_failed",
            Self::ReadFailed { .. } => "read_failed",
            Self::ShuttingDown { .. } => "shutting_down",
            Self::Abandoned { .. } => "abandoned",
            Self::Artifact(_) => "artifact",
        }
    }
}
