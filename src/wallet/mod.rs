//! Wallet subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variable (private key)
//!     → local.rs (signer + signing provider)
//!     → session.rs (detection, authorized account)
//!     → contract client (signs and broadcasts writes)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - A missing key is "no provider", never a crash

pub mod local;
pub mod session;
pub mod types;

use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use std::future::Future;

pub use local::LocalWallet;
pub use session::Session;
pub use types::{WalletError, WalletResult};

/// An account holder that authorizes accounts and signs transactions,
/// shaped after the EIP-1193 requests an injected browser wallet serves.
pub trait WalletProvider: Send + Sync + 'static {
    /// Accounts already authorized for this application (`eth_accounts`).
    /// Never prompts.
    fn accounts(&self) -> impl Future<Output = WalletResult<Vec<Address>>> + Send;

    /// Ask the user to authorize an account (`eth_requestAccounts`).
    fn request_accounts(&self) -> impl Future<Output = WalletResult<Vec<Address>>> + Send;

    /// Sign and broadcast a transaction (`eth_sendTransaction`).
    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = WalletResult<TxHash>> + Send;
}
