//! Contract client subsystem.
//!
//! # Data Flow
//! ```text
//! abi.rs (sol! bindings)
//!     → interface.rs (descriptor check, Hardhat artifacts)
//!     → client.rs (typed reads via the ledger, writes via the wallet)
//!     → types.rs (decoded records, validated input)
//! ```

pub mod abi;
pub mod client;
pub mod interface;
pub mod types;

pub use client::{parse_contract_address, ContractClient};
pub use interface::{Artifact, ContractInterface};
pub use types::{format_amount, parse_amount, PatientId, Record};
