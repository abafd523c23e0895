//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and formats.
//! All errors are collected, not just the first.

use alloy::primitives::utils::parse_ether;
use alloy::primitives::Address;

use crate::config::schema::EhrConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &EhrConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.ledger.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new("ledger.rpc_url", format!("invalid URL: {}", e)));
    }
    for (i, failover) in config.ledger.failover_urls.iter().enumerate() {
        if failover.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                &format!("ledger.failover_urls[{}]", i),
                "invalid URL",
            ));
        }
    }
    if config.ledger.chain_id == 0 {
        errors.push(ValidationError::new("ledger.chain_id", "must be non-zero"));
    }
    if config.ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be positive"));
    }

    if !config.contract.address.is_empty() && config.contract.address.parse::<Address>().is_err() {
        errors.push(ValidationError::new("contract.address", "not a 20-byte hex address"));
    }

    if config.wallet.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("wallet.private_key_env", "must name an environment variable"));
    }

    let tx = &config.transactions;
    if tx.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new("transactions.confirmation_timeout_secs", "must be positive"));
    }
    if tx.poll_interval_ms == 0 {
        errors.push(ValidationError::new("transactions.poll_interval_ms", "must be positive"));
    }
    if tx.refresh_backoff_base_ms > tx.refresh_backoff_max_ms {
        errors.push(ValidationError::new(
            "transactions.refresh_backoff_base_ms",
            "must not exceed refresh_backoff_max_ms",
        ));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("expected one of {}", LOG_LEVELS.join(", ")),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "invalid socket address"));
    }

    if parse_ether(&config.deploy.initial_balance_eth).is_err() {
        errors.push(ValidationError::new("deploy.initial_balance_eth", "not an ether amount"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
