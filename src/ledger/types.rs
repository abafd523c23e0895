//! Ledger-level types and error definitions.

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur while talking to the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Returned data did not match the contract ABI.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// The parts of a transaction receipt the client acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// False when the transaction reverted.
    pub success: bool,
    pub gas_used: u64,
    /// Set for contract-creation transactions.
    pub contract_address: Option<Address>,
}
