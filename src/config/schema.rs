//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the EHR client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EhrConfig {
    /// JSON-RPC ledger connection.
    pub ledger: LedgerConfig,

    /// Deployed contract location and interface.
    pub contract: ContractConfig,

    /// Wallet provider settings.
    pub wallet: WalletConfig,

    /// Confirmation and refresh policy.
    pub transactions: TransactionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Contract deployment settings.
    pub deploy: DeployConfig,
}

/// Ledger (JSON-RPC) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for a local Hardhat node).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 10,
        }
    }
}

/// Deployed contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractConfig {
    /// Address of the deployed EHRManagement contract.
    pub address: String,

    /// Optional Hardhat artifact used as the interface descriptor.
    /// The built-in interface is used when unset.
    pub artifact: Option<String>,
}

/// How the local wallet answers authorization and signing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalPolicy {
    /// Approve every request without asking.
    #[default]
    Auto,
    /// Ask on the terminal before each request.
    Prompt,
}

/// Wallet provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Environment variable holding the hex private key.
    pub private_key_env: String,

    /// Approval policy for authorization and signing.
    pub approval: ApprovalPolicy,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: "EHR_WALLET_PRIVATE_KEY".to_string(),
            approval: ApprovalPolicy::Auto,
            max_gas_price_gwei: 500,
        }
    }
}

/// Transaction confirmation and post-confirmation refresh policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Number of blocks (including the inclusion block) required for finality.
    pub confirmation_blocks: u32,

    /// Maximum wait for a confirmation before reporting a timeout.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Read retries for the refresh that follows a confirmation.
    pub refresh_retries: u32,

    /// Base backoff between refresh retries.
    pub refresh_backoff_base_ms: u64,

    /// Backoff ceiling between refresh retries.
    pub refresh_backoff_max_ms: u64,
}

impl TransactionConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            confirmation_blocks: 1,
            confirmation_timeout_secs: 120,
            poll_interval_ms: 1000,
            refresh_retries: 3,
            refresh_backoff_base_ms: 200,
            refresh_backoff_max_ms: 2000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Contract deployment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Constructor `initBalance` argument, in ether.
    pub initial_balance_eth: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            initial_balance_eth: "1".to_string(),
        }
    }
}
