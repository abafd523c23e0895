//! Domain types read from and written to the contract.

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::abi::EHRManagement;
use crate::error::EhrError;

/// A medical record as stored on the ledger. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub data: String,
    pub timestamp: DateTime<Utc>,
    pub added_by: Address,
}

impl TryFrom<EHRManagement::Record> for Record {
    type Error = String;

    fn try_from(raw: EHRManagement::Record) -> Result<Self, Self::Error> {
        let id = u64::try_from(raw.id).map_err(|_| format!("record id {} overflows u64", raw.id))?;
        let secs = i64::try_from(raw.timestamp)
            .map_err(|_| format!("record timestamp {} out of range", raw.timestamp))?;
        let timestamp = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| format!("record timestamp {} out of range", secs))?;

        Ok(Self {
            id,
            data: raw.recordData,
            timestamp,
            added_by: raw.addedBy,
        })
    }
}

/// A positive patient identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(u64);

impl PatientId {
    pub fn new(id: u64) -> Result<Self, EhrError> {
        if id == 0 {
            return Err(EhrError::invalid("patient id", "must be a positive integer"));
        }
        Ok(Self(id))
    }

    /// Parse user input; leading zeros are ignored.
    pub fn parse(input: &str) -> Result<Self, EhrError> {
        let trimmed = input.trim();
        let digits = trimmed.trim_start_matches('0');
        if trimmed.is_empty() || digits.is_empty() {
            return Err(EhrError::invalid("patient id", "must be a positive integer"));
        }
        let id = digits
            .parse::<u64>()
            .map_err(|_| EhrError::invalid("patient id", format!("'{}' is not a positive integer", trimmed)))?;
        Self::new(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PatientId> for U256 {
    fn from(id: PatientId) -> Self {
        U256::from(id.0)
    }
}

/// Parse a positive ether amount (e.g. `"0.5"`) into wei.
pub fn parse_amount(field: &'static str, input: &str) -> Result<U256, EhrError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(EhrError::invalid(field, "amount is required"));
    }
    if trimmed.starts_with('-') {
        return Err(EhrError::invalid(field, "amount must be greater than zero"));
    }
    let wei = parse_ether(trimmed)
        .map_err(|e| EhrError::invalid(field, format!("'{}' is not an ether amount: {}", trimmed, e)))?;
    if wei.is_zero() {
        return Err(EhrError::invalid(field, "amount must be greater than zero"));
    }
    Ok(wei)
}

/// Render wei as ether without trailing zeros (`1.5`, `2.0`).
pub fn format_amount(wei: U256) -> String {
    let ether = format_ether(wei);
    match ether.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", ether),
    }
}

/// Reject empty or whitespace-only text.
pub fn require_text(field: &'static str, input: &str) -> Result<(), EhrError> {
    if input.trim().is_empty() {
        return Err(EhrError::invalid(field, "must not be empty"));
    }
    Ok(())
}
