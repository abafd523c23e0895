//! Pending transactions and their state machine.
//!
//! # State Transitions
//! ```text
//! Idle → Submitted: wallet broadcast returned a hash
//! Submitted → Confirmed: receipt succeeded with enough block depth
//! Submitted → Rejected: receipt failed, or the node/wallet refused it
//! Submitted → TimedOut: no receipt within the confirmation timeout
//! ```

use alloy::primitives::TxHash;
use alloy::rpc::types::TransactionRequest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::EhrError;
use crate::wallet::WalletProvider;

/// A user-initiated, state-changing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    RegisterPatient,
    AddRecord,
    Deposit,
    Withdraw,
    Deploy,
}

impl Action {
    /// Contract method invoked by this action.
    pub fn method_name(self) -> &'static str {
        match self {
            Action::RegisterPatient => "registerPatient",
            Action::AddRecord => "addRecord",
            Action::Deposit => "deposit",
            Action::Withdraw => "withdraw",
            Action::Deploy => "constructor",
        }
    }

    /// Stable label for metrics.
    pub fn label(self) -> &'static str {
        match self {
            Action::RegisterPatient => "register_patient",
            Action::AddRecord => "add_record",
            Action::Deposit => "deposit",
            Action::Withdraw => "withdraw",
            Action::Deploy => "deploy",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Action::RegisterPatient => "register patient",
            Action::AddRecord => "add record",
            Action::Deposit => "deposit",
            Action::Withdraw => "withdraw",
            Action::Deploy => "deploy contract",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TxState {
    Idle,
    Submitted,
    Confirmed { block_number: u64 },
    Rejected { reason: String },
    TimedOut,
}

impl TxState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Confirmed { .. } | TxState::Rejected { .. } | TxState::TimedOut)
    }
}

/// One submitted action. Never coalesced with another.
#[derive(Debug, Clone, Serialize)]
pub struct PendingTransaction {
    pub id: Uuid,
    pub action: Action,
    pub method_name: &'static str,
    /// Human-readable arguments, in call order.
    pub arguments: Vec<String>,
    pub submitted_at: DateTime<Utc>,
    pub tx_hash: Option<TxHash>,
    pub state: TxState,
}

impl PendingTransaction {
    pub fn new(action: Action, arguments: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            method_name: action.method_name(),
            arguments,
            submitted_at: Utc::now(),
            tx_hash: None,
            state: TxState::Idle,
        }
    }

    pub fn mark_submitted(&mut self, tx_hash: TxHash) {
        if self.state == TxState::Idle {
            self.tx_hash = Some(tx_hash);
            self.submitted_at = Utc::now();
            self.state = TxState::Submitted;
        }
    }

    pub fn confirm(&mut self, block_number: u64) {
        if !self.state.is_terminal() {
            self.state = TxState::Confirmed { block_number };
        }
    }

    pub fn reject(&mut self, reason: impl Into<String>) {
        if !self.state.is_terminal() {
            self.state = TxState::Rejected { reason: reason.into() };
        }
    }

    pub fn time_out(&mut self) {
        if self.state == TxState::Submitted {
            self.state = TxState::TimedOut;
        }
    }
}

/// Hand `tx` to the wallet and track it as `action`.
pub async fn submit_transaction<W: WalletProvider>(
    wallet: &W,
    action: Action,
    arguments: Vec<String>,
    tx: TransactionRequest,
) -> Result<PendingTransaction, EhrError> {
    let mut pending = PendingTransaction::new(action, arguments);

    match wallet.send_transaction(tx).await {
        Ok(tx_hash) => {
            pending.mark_submitted(tx_hash);
            tracing::info!(
                id = %pending.id,
                action = %action,
                tx_hash = %tx_hash,
                "Transaction submitted"
            );
            Ok(pending)
        }
        Err(e) => {
            tracing::warn!(id = %pending.id, action = %action, error = %e, "Transaction not submitted");
            Err(EhrError::from_wallet(action, e))
        }
    }
}
