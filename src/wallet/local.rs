//! Private-key wallet provider with terminal approval.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::{ApprovalPolicy, LedgerConfig, WalletConfig};
use crate::wallet::types::{classify_submission_error, WalletError, WalletResult};
use crate::wallet::WalletProvider;

/// Wallet that signs with a local key and broadcasts over JSON-RPC.
pub struct LocalWallet {
    signer: PrivateKeySigner,
    /// Provider with a signing filler for `signer`.
    provider: Arc<dyn Provider + Send + Sync>,
    approval: ApprovalPolicy,
    authorized: AtomicBool,
    /// Next nonce; `None` until synced from the chain.
    nonce: Mutex<Option<u64>>,
    chain_id: u64,
    max_gas_price_gwei: u64,
}

impl LocalWallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// The key may carry a `0x` prefix. It is never logged.
    pub fn from_private_key(
        private_key_hex: &str,
        ledger: &LedgerConfig,
        config: &WalletConfig,
    ) -> WalletResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| WalletError::Signer(format!("Invalid private key format: {}", e)))?;

        let url: url::Url = ledger
            .rpc_url
            .parse()
            .map_err(|e| WalletError::Submission(format!("Invalid RPC URL '{}': {}", ledger.rpc_url, e)))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(url);

        tracing::info!(
            address = %signer.address(),
            chain_id = ledger.chain_id,
            approval = ?config.approval,
            "Local wallet initialized"
        );

        Ok(Self {
            signer,
            provider: Arc::new(provider),
            approval: config.approval,
            authorized: AtomicBool::new(false),
            nonce: Mutex::new(None),
            chain_id: ledger.chain_id,
            max_gas_price_gwei: config.max_gas_price_gwei,
        })
    }

    /// Load the wallet from the configured environment variable.
    ///
    /// Returns `Ok(None)` when the variable is unset: no provider is
    /// installed, which is not an error at this stage.
    pub fn from_env(ledger: &LedgerConfig, config: &WalletConfig) -> WalletResult<Option<Self>> {
        match std::env::var(&config.private_key_env) {
            Ok(key) => Self::from_private_key(&key, ledger, config).map(Some),
            Err(_) => {
                tracing::debug!(env = %config.private_key_env, "No wallet key in environment");
                Ok(None)
            }
        }
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    async fn approve(&self, request: String) -> bool {
        match self.approval {
            ApprovalPolicy::Auto => true,
            ApprovalPolicy::Prompt => tokio::task::spawn_blocking(move || prompt_yes_no(&request))
                .await
                .unwrap_or(false),
        }
    }

    /// Take the next nonce, syncing from the pending block on first use.
    async fn next_nonce(&self) -> WalletResult<u64> {
        let mut nonce = self.nonce.lock().await;
        let next = match *nonce {
            Some(n) => n,
            None => self
                .provider
                .get_transaction_count(self.address())
                .pending()
                .await
                .map_err(|e| WalletError::Submission(e.to_string()))?,
        };
        *nonce = Some(next + 1);
        Ok(next)
    }

    async fn reset_nonce(&self) {
        *self.nonce.lock().await = None;
    }

    async fn check_gas_price(&self) -> WalletResult<()> {
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| WalletError::Submission(e.to_string()))?;
        let current_gwei = (gas_price / 1_000_000_000) as u64;
        if current_gwei > self.max_gas_price_gwei {
            return Err(WalletError::GasPriceTooHigh {
                current_gwei,
                max_gwei: self.max_gas_price_gwei,
            });
        }
        Ok(())
    }
}

impl WalletProvider for LocalWallet {
    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        if self.authorized.load(Ordering::SeqCst) {
            Ok(vec![self.address()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        if !self.authorized.load(Ordering::SeqCst) {
            let question = format!("Connect account {} to this application?", self.address());
            if !self.approve(question).await {
                return Err(WalletError::UserRejected("account authorization".to_string()));
            }
            self.authorized.store(true, Ordering::SeqCst);
            tracing::info!(address = %self.address(), "Account authorized");
        }
        Ok(vec![self.address()])
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> WalletResult<TxHash> {
        let from = tx.from.unwrap_or(self.address());
        if from != self.address() || !self.authorized.load(Ordering::SeqCst) {
            return Err(WalletError::Unauthorized(from));
        }

        let summary = describe(&tx);
        if !self.approve(format!("Sign and send {}?", summary)).await {
            return Err(WalletError::UserRejected("transaction signature".to_string()));
        }

        self.check_gas_price().await?;
        let nonce = self.next_nonce().await?;

        let tx = tx
            .with_from(from)
            .with_nonce(nonce)
            .with_chain_id(self.chain_id);

        match self.provider.send_transaction(tx).await {
            Ok(pending) => {
                let tx_hash = *pending.tx_hash();
                tracing::debug!(tx_hash = %tx_hash, nonce, "Transaction broadcast");
                Ok(tx_hash)
            }
            Err(e) => {
                // The nonce was not consumed on-chain; resync before the next send.
                self.reset_nonce().await;
                Err(classify_submission_error(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .field("approval", &self.approval)
            .finish()
    }
}

fn describe(tx: &TransactionRequest) -> String {
    let target = match tx.to.as_ref().and_then(|kind| kind.to()) {
        Some(to) => format!("call to {}", to),
        None => "contract creation".to_string(),
    };
    match tx.value {
        Some(value) if !value.is_zero() => {
            format!("{} with {} ETH", target, alloy::primitives::utils::format_ether(value))
        }
        _ => target,
    }
}

fn prompt_yes_no(question: &str) -> bool {
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "{} [y/N] ", question);
    let _ = stderr.flush();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    // Well-known test private key (first Hardhat/Anvil account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn wallet() -> LocalWallet {
        LocalWallet::from_private_key(TEST_PRIVATE_KEY, &LedgerConfig::default(), &WalletConfig::default())
            .unwrap()
    }

    #[test]
    fn test_wallet_from_private_key() {
        assert_eq!(
            wallet().address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_wallet_with_0x_prefix() {
        let wallet = LocalWallet::from_private_key(
            &format!("0x{}", TEST_PRIVATE_KEY),
            &LedgerConfig::default(),
            &WalletConfig::default(),
        )
        .unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let result = LocalWallet::from_private_key("invalid_key", &LedgerConfig::default(), &WalletConfig::default());
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[test]
    fn test_missing_env_means_no_provider() {
        let config = WalletConfig {
            private_key_env: "EHR_DAPP_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..WalletConfig::default()
        };
        let wallet = LocalWallet::from_env(&LedgerConfig::default(), &config).unwrap();
        assert!(wallet.is_none());
    }

    #[tokio::test]
    async fn test_accounts_require_authorization() {
        let wallet = wallet();
        assert!(wallet.accounts().await.unwrap().is_empty());

        let authorized = wallet.request_accounts().await.unwrap();
        assert_eq!(authorized, vec![wallet.address()]);
        assert_eq!(wallet.accounts().await.unwrap(), vec![wallet.address()]);
    }

    #[tokio::test]
    async fn test_send_before_authorization_is_refused() {
        let wallet = wallet();
        let tx = TransactionRequest::default().with_to(Address::ZERO);
        let err = wallet.send_transaction(tx).await.unwrap_err();
        assert!(matches!(err, WalletError::Unauthorized(_)));
    }

    #[test]
    fn test_describe_payable_call() {
        let tx = TransactionRequest::default()
            .with_to(Address::ZERO)
            .with_value(U256::from(10u64).pow(U256::from(18u64)));
        let summary = describe(&tx);
        assert!(summary.starts_with("call to 0x0000"));
        assert!(summary.contains(" with 1."));
        assert!(summary.ends_with(" ETH"));
    }
}
