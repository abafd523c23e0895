//! Wallet provider errors.

use alloy::primitives::Address;
use thiserror::Error;

/// Errors reported by a wallet provider.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The user declined an authorization or signing request.
    #[error("User rejected {0}")]
    UserRejected(String),

    /// A transaction was requested from an account that was never authorized.
    #[error("Account {0} is not authorized")]
    Unauthorized(Address),

    /// Invalid private key format or signing failure.
    #[error("Signer error: {0}")]
    Signer(String),

    /// The node refused the transaction before inclusion (revert during
    /// estimation, insufficient funds).
    #[error("Transaction rejected by node: {0}")]
    Reverted(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Broadcast failed for a transport reason.
    #[error("Submission failed: {0}")]
    Submission(String),
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// Classify a node/transport error message raised while submitting.
pub fn classify_submission_error(message: String) -> WalletError {
    let lower = message.to_lowercase();
    if lower.contains("user denied") || lower.contains("user rejected") {
        WalletError::UserRejected(message)
    } else if lower.contains("revert") || lower.contains("insufficient funds") {
        WalletError::Reverted(message)
    } else {
        WalletError::Submission(message)
    }
}
