//! Confirmation monitoring.
//!
//! # Responsibilities
//! - Poll the ledger for the receipt of a submitted transaction
//! - Count block depth until the required confirmations are reached
//! - Bound the whole wait with a timeout

use alloy::primitives::TxHash;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::config::TransactionConfig;
use crate::ledger::{Ledger, Receipt};

/// How long and how deep to wait for a transaction.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationPolicy {
    /// Blocks of depth, counting the inclusion block. Zero is treated as one.
    pub required_confirmations: u32,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl From<&TransactionConfig> for ConfirmationPolicy {
    fn from(config: &TransactionConfig) -> Self {
        Self {
            required_confirmations: config.confirmation_blocks,
            poll_interval: config.poll_interval(),
            timeout: config.confirmation_timeout(),
        }
    }
}

/// Terminal result of waiting on a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Confirmed(Receipt),
    /// Included, but execution failed.
    Reverted(Receipt),
    TimedOut,
}

/// Wait for `tx_hash` to reach the policy's confirmation depth.
///
/// Ledger errors while polling are treated as "not yet known": only the
/// timeout ends an unanswered wait.
pub async fn wait_for_confirmation<L: Ledger>(
    ledger: &L,
    tx_hash: TxHash,
    policy: &ConfirmationPolicy,
) -> WaitOutcome {
    let required = policy.required_confirmations.max(1);

    let result = timeout(policy.timeout, async {
        let mut ticker = interval(policy.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let receipt = match ledger.receipt(tx_hash).await {
                Ok(Some(r)) => r,
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed");
                    continue;
                }
            };

            if !receipt.success {
                return WaitOutcome::Reverted(receipt);
            }

            let current_block = match ledger.block_number().await {
                Ok(block) => block,
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number lookup failed");
                    continue;
                }
            };
            let tx_block = receipt.block_number.unwrap_or(current_block);
            let confirmations = current_block.saturating_sub(tx_block) as u32 + 1;

            if confirmations >= required {
                return WaitOutcome::Confirmed(receipt);
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = confirmations,
                required = required,
                "Waiting for confirmations"
            );
        }
    })
    .await;

    result.unwrap_or(WaitOutcome::TimedOut)
}
