//! Ledger-derived view snapshot.
//!
//! # Consistency
//! - Readers load an immutable `ViewSnapshot`; each setter swaps in a new
//!   snapshot with exactly one field changed
//! - Every read takes a `Ticket` before it starts. A completion whose
//!   ticket is older than the last applied one for that field is dropped,
//!   so a slow refresh can never overwrite a newer value
//! - Fields are only written from successful reads

use alloy::primitives::{Address, U256};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;

use crate::contract::{format_amount, PatientId, Record};
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewField {
    Account,
    Balance,
    PatientCount,
    Records,
}

impl ViewField {
    const DERIVED: [ViewField; 3] = [ViewField::Balance, ViewField::PatientCount, ViewField::Records];

    pub fn label(self) -> &'static str {
        match self {
            ViewField::Account => "account",
            ViewField::Balance => "balance",
            ViewField::PatientCount => "patient_count",
            ViewField::Records => "records",
        }
    }
}

/// Ordering token for one read of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    field: ViewField,
    seq: u64,
}

impl Ticket {
    pub fn field(&self) -> ViewField {
        self.field
    }
}

/// Records of the patient most recently loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientRecords {
    pub patient_id: PatientId,
    pub records: Vec<Record>,
}

/// What the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub account: Option<Address>,
    /// Contract balance in wei; rendered in ether.
    #[serde(rename = "balance_eth", serialize_with = "serialize_ether")]
    pub balance: Option<U256>,
    pub patient_count: Option<u64>,
    pub records: Option<PatientRecords>,
    /// Bumped on every applied update.
    pub version: u64,
}

impl ViewSnapshot {
    /// Balance formatted in ether, as shown to users.
    pub fn balance_eth(&self) -> Option<String> {
        self.balance.map(format_amount)
    }
}

fn serialize_ether<S: Serializer>(balance: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
    match balance {
        Some(wei) => serializer.serialize_some(&format_amount(*wei)),
        None => serializer.serialize_none(),
    }
}

/// Single source of truth for rendering.
pub struct ViewState {
    snapshot: ArcSwap<ViewSnapshot>,
    issued: DashMap<ViewField, u64>,
    applied: DashMap<ViewField, u64>,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(ViewSnapshot::default()),
            issued: DashMap::new(),
            applied: DashMap::new(),
        }
    }

    /// Current snapshot. Never partially updated.
    pub fn snapshot(&self) -> Arc<ViewSnapshot> {
        self.snapshot.load_full()
    }

    /// Reserve the next sequence number for `field`. Take it before the read starts.
    pub fn ticket(&self, field: ViewField) -> Ticket {
        let mut issued = self.issued.entry(field).or_insert(0);
        *issued += 1;
        Ticket { field, seq: *issued }
    }

    pub fn set_account(&self, ticket: Ticket, account: Option<Address>) -> bool {
        self.apply(ticket, ViewField::Account, |view| view.account = account)
    }

    pub fn set_balance(&self, ticket: Ticket, balance: U256) -> bool {
        self.apply(ticket, ViewField::Balance, |view| view.balance = Some(balance))
    }

    pub fn set_patient_count(&self, ticket: Ticket, count: u64) -> bool {
        self.apply(ticket, ViewField::PatientCount, |view| view.patient_count = Some(count))
    }

    pub fn set_records(&self, ticket: Ticket, patient_id: PatientId, records: Vec<Record>) -> bool {
        self.apply(ticket, ViewField::Records, |view| {
            view.records = Some(PatientRecords {
                patient_id,
                records: records.clone(),
            })
        })
    }

    /// Start over for a different account: clear every derived field and
    /// invalidate reads already in flight for the previous one.
    pub fn reset_for_account(&self, account: Option<Address>) {
        for field in ViewField::DERIVED {
            let issued = self.issued.get(&field).map(|v| *v).unwrap_or(0);
            self.applied.insert(field, issued);
        }
        let account_ticket = self.ticket(ViewField::Account);
        self.apply(account_ticket, ViewField::Account, |view| {
            view.account = account;
            view.balance = None;
            view.patient_count = None;
            view.records = None;
        });
    }

    fn apply(&self, ticket: Ticket, field: ViewField, update: impl Fn(&mut ViewSnapshot)) -> bool {
        if ticket.field != field {
            tracing::error!(ticket = ?ticket.field, field = ?field, "Ticket used for the wrong field");
            return false;
        }

        // Holding the entry serializes writers of this field.
        let mut applied = self.applied.entry(field).or_insert(0);
        if ticket.seq <= *applied {
            tracing::debug!(
                field = field.label(),
                seq = ticket.seq,
                applied = *applied,
                "Discarding stale view update"
            );
            metrics::record_view_discarded(field.label());
            return false;
        }
        *applied = ticket.seq;

        self.snapshot.rcu(|current| {
            let mut next = ViewSnapshot::clone(current);
            update(&mut next);
            next.version = current.version + 1;
            next
        });
        true
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewState")
            .field("snapshot", &self.snapshot.load())
            .finish()
    }
}
