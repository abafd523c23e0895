//! JSON-RPC ledger with timeout, failover and error handling.
//!
//! # Responsibilities
//! - Connect to the primary and failover JSON-RPC endpoints
//! - Query chain state (block number, receipts, eth_call)
//! - Handle timeouts and network errors gracefully

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::TransportError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LedgerConfig;
use crate::ledger::types::{ChainId, LedgerError, LedgerResult, Receipt};
use crate::ledger::Ledger;

type SharedProvider = Arc<dyn Provider + Send + Sync>;

/// Read-side ledger over one or more JSON-RPC providers.
#[derive(Clone)]
pub struct RpcLedger {
    /// List of providers (primary + failovers).
    providers: Vec<SharedProvider>,
    config: LedgerConfig,
    timeout_duration: Duration,
}

impl RpcLedger {
    /// Create a ledger over the configured endpoints.
    ///
    /// Succeeds even when the node is unreachable; a chain id mismatch is
    /// only logged so reads can still surface precise errors later.
    pub async fn connect(config: LedgerConfig) -> LedgerResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            LedgerError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as SharedProvider);

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as SharedProvider);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let ledger = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        match ledger.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Ledger connected"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ledger connected but chain verification failed");
            }
        }

        Ok(ledger)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> LedgerResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> LedgerResult<ChainId> {
        self.with_failover("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Run `op` against each provider in order until one answers in time.
    async fn with_failover<T, F, Fut>(&self, method: &'static str, op: F) -> LedgerResult<T>
    where
        F: Fn(SharedProvider) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut last_error = None;
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, op(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, method, error = %e, "RPC error, trying next provider");
                    last_error = Some(LedgerError::Rpc(e.to_string()));
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, method, "RPC timeout, trying next provider");
                    last_error = Some(LedgerError::Timeout(self.timeout_duration.as_secs()));
                }
            }
        }

        // A single provider keeps its precise error; several collapse into one.
        match last_error {
            Some(e) if self.providers.len() == 1 => Err(e),
            _ => Err(LedgerError::Rpc(format!("All RPC providers failed ({})", method))),
        }
    }
}

impl Ledger for RpcLedger {
    async fn call(&self, from: Address, to: Address, input: Bytes) -> LedgerResult<Bytes> {
        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(input);

        self.with_failover("eth_call", |p| {
            let request = request.clone();
            async move { p.call(request).await }
        })
        .await
    }

    async fn receipt(&self, tx_hash: TxHash) -> LedgerResult<Option<Receipt>> {
        let receipt = self
            .with_failover("eth_getTransactionReceipt", |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;
        Ok(receipt.map(|r| receipt_from_rpc(&r)))
    }

    async fn block_number(&self) -> LedgerResult<u64> {
        self.with_failover("eth_blockNumber", |p| async move { p.get_block_number().await })
            .await
    }
}

fn receipt_from_rpc(receipt: &TransactionReceipt) -> Receipt {
    Receipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        success: receipt.status(),
        gas_used: receipt.gas_used,
        contract_address: receipt.contract_address,
    }
}

impl std::fmt::Debug for RpcLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedger")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("providers", &self.providers.len())
            .finish()
    }
}
