//! Submit, confirm, refresh.
//!
//! # Responsibilities
//! - Await the wallet's submission of one action
//! - Wait for confirmation without blocking unrelated flows
//! - Run the caller's refresh only after a confirmation
//! - Stop waiting when the shutdown signal fires
//!
//! Each call to [`TxOrchestrator::execute`] is independent. Overlapping
//! calls for the same action are neither queued nor coalesced.

use alloy::primitives::TxHash;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::config::TransactionConfig;
use crate::error::EhrError;
use crate::ledger::{Ledger, Receipt};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::orchestrator::confirm::{wait_for_confirmation, ConfirmationPolicy, WaitOutcome};
use crate::orchestrator::transaction::{Action, PendingTransaction};
use crate::resilience::{retry_with_backoff, RetryPolicy};

/// A confirmed action.
#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub transaction: PendingTransaction,
    pub receipt: Receipt,
    /// True when the follow-up refresh failed; the view may lag the ledger.
    pub view_stale: bool,
}

pub struct TxOrchestrator<L> {
    ledger: Arc<L>,
    policy: ConfirmationPolicy,
    retry: RetryPolicy,
    shutdown: Shutdown,
}

impl<L: Ledger> TxOrchestrator<L> {
    pub fn new(ledger: Arc<L>, config: &TransactionConfig, shutdown: Shutdown) -> Self {
        Self::with_policies(ledger, ConfirmationPolicy::from(config), RetryPolicy::from(config), shutdown)
    }

    pub fn with_policies(
        ledger: Arc<L>,
        policy: ConfirmationPolicy,
        retry: RetryPolicy,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            ledger,
            policy,
            retry,
            shutdown,
        }
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Signal that abandons every wait in progress.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run one action to a terminal state.
    ///
    /// `refresh` runs only once the transaction is confirmed. Rejected,
    /// timed-out and abandoned transactions never refresh.
    pub async fn execute<S, F, Fut>(
        &self,
        action: Action,
        submission: S,
        refresh: F,
    ) -> Result<Confirmation, EhrError>
    where
        S: Future<Output = Result<PendingTransaction, EhrError>>,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(), EhrError>>,
    {
        // Subscribe before submitting so an interrupt during signing is seen.
        let mut abandon = self.shutdown.subscribe();

        // `submission` is lazy: refusing here means nothing is signed or sent.
        if self.shutdown.is_triggered() {
            metrics::record_transaction(action.label(), "shutting_down");
            tracing::warn!(action = %action, "Shutdown requested, action not submitted");
            return Err(EhrError::ShuttingDown { action });
        }

        let mut pending = match submission.await {
            Ok(pending) => pending,
            Err(e) => {
                metrics::record_transaction(action.label(), e.kind());
                return Err(e);
            }
        };
        let Some(tx_hash) = pending.tx_hash else {
            metrics::record_transaction(action.label(), "submission_failed");
            return Err(EhrError::SubmissionFailed {
                action,
                reason: "wallet returned no transaction hash".to_string(),
            });
        };

        if self.shutdown.is_triggered() {
            return Err(self.abandoned(&pending, tx_hash));
        }

        let started = Instant::now();
        let outcome = tokio::select! {
            outcome = wait_for_confirmation(self.ledger.as_ref(), tx_hash, &self.policy) => outcome,
            _ = abandon.recv() => return Err(self.abandoned(&pending, tx_hash)),
        };

        match outcome {
            WaitOutcome::Confirmed(receipt) => {
                let block_number = receipt.block_number.unwrap_or_default();
                pending.confirm(block_number);
                metrics::record_transaction(action.label(), "confirmed");
                metrics::record_confirmation_latency(action.label(), started.elapsed().as_secs_f64());
                tracing::info!(
                    id = %pending.id,
                    action = %action,
                    tx_hash = %tx_hash,
                    block_number = block_number,
                    "Transaction confirmed"
                );

                let view_stale = !self.run_refresh(&pending, refresh).await;
                Ok(Confirmation {
                    transaction: pending,
                    receipt,
                    view_stale,
                })
            }
            WaitOutcome::Reverted(receipt) => {
                let reason = match receipt.block_number {
                    Some(block) => format!("transaction {} failed in block {}", tx_hash, block),
                    None => format!("transaction {} failed", tx_hash),
                };
                pending.reject(reason.clone());
                metrics::record_transaction(action.label(), "reverted");
                tracing::warn!(id = %pending.id, action = %action, tx_hash = %tx_hash, "Transaction reverted");
                Err(EhrError::TransactionReverted { action, reason })
            }
            WaitOutcome::TimedOut => {
                pending.time_out();
                let waited_secs = self.policy.timeout.as_secs();
                metrics::record_transaction(action.label(), "timed_out");
                tracing::warn!(
                    id = %pending.id,
                    action = %action,
                    tx_hash = %tx_hash,
                    waited_secs = waited_secs,
                    "Transaction not confirmed in time"
                );
                Err(EhrError::TransactionTimedOut {
                    action,
                    tx_hash,
                    waited_secs,
                })
            }
        }
    }

    /// Returns false when the view could not be brought up to date.
    async fn run_refresh<F, Fut>(&self, pending: &PendingTransaction, refresh: F) -> bool
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(), EhrError>>,
    {
        if self.shutdown.is_triggered() {
            tracing::warn!(id = %pending.id, "Shutdown in progress, refresh skipped");
            return false;
        }

        let result = retry_with_backoff(
            &self.retry,
            |e: &EhrError| matches!(e, EhrError::ReadFailed { .. }),
            &refresh,
        )
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    id = %pending.id,
                    action = %pending.action,
                    error = %e,
                    "Refresh failed after confirmation, view is stale"
                );
                false
            }
        }
    }

    fn abandoned(&self, pending: &PendingTransaction, tx_hash: TxHash) -> EhrError {
        metrics::record_transaction(pending.action.label(), "abandoned");
        tracing::warn!(
            id = %pending.id,
            action = %pending.action,
            tx_hash = %tx_hash,
            "Stopped waiting; the transaction may still be included"
        );
        EhrError::Abandoned {
            action: pending.action,
            tx_hash,
        }
    }
}
