//! Ledger boundary.
//!
//! # Data Flow
//! ```text
//! Contract client (encoded calldata)
//!     → Ledger::call (eth_call, no transaction)
//! Orchestrator (tx hash)
//!     → Ledger::receipt / Ledger::block_number (confirmation polling)
//! ```
//!
//! Writes never go through the ledger: they are signed and broadcast by
//! the wallet provider, mirroring how an injected browser wallet works.

pub mod rpc;
pub mod types;

use alloy::primitives::{Address, Bytes, TxHash};
use std::future::Future;

pub use rpc::RpcLedger;
pub use types::{ChainId, LedgerError, LedgerResult, Receipt};

/// Read access to the chain that holds the contract.
pub trait Ledger: Send + Sync + 'static {
    /// Execute a read-only contract call against the latest state.
    fn call(
        &self,
        from: Address,
        to: Address,
        input: Bytes,
    ) -> impl Future<Output = LedgerResult<Bytes>> + Send;

    /// Fetch the receipt for a transaction, if it has been included.
    fn receipt(&self, tx_hash: TxHash) -> impl Future<Output = LedgerResult<Option<Receipt>>> + Send;

    /// Latest block number.
    fn block_number(&self) -> impl Future<Output = LedgerResult<u64>> + Send;
}
