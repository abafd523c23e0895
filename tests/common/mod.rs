//! Shared utilities for integration tests.
//!
//! `MockChain` is an in-memory chain running the EHRManagement contract.
//! It serves both sides of the façade: reads and receipts (`Ledger`) and
//! authorization and signing (`WalletProvider`).

#![allow(dead_code)]

use alloy::primitives::{address, keccak256, Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::{SolCall, SolInterface, SolValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ehr_dapp::contract::abi::EHRManagement::{self, EHRManagementCalls};
use ehr_dapp::contract::ContractInterface;
use ehr_dapp::ledger::{Ledger, LedgerError, LedgerResult, Receipt};
use ehr_dapp::lifecycle::Shutdown;
use ehr_dapp::orchestrator::{ConfirmationPolicy, TxOrchestrator};
use ehr_dapp::resilience::RetryPolicy;
use ehr_dapp::wallet::{Session, WalletError, WalletProvider, WalletResult};
use ehr_dapp::EhrApp;

pub const CONTRACT: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
pub const ALICE: Address = address!("0x0000000000000000000000000000000000000abc");
pub const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");

const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// One ether in wei.
pub fn eth(amount: u64) -> U256 {
    U256::from(amount) * U256::from(1_000_000_000_000_000_000u64)
}

#[derive(Default)]
struct State {
    // Contract storage
    patient_count: u64,
    patients: HashMap<u64, (String, Address)>,
    records: HashMap<u64, Vec<EHRManagement::Record>>,
    next_record_id: u64,
    balance: U256,
    constructor_arg: Option<U256>,

    // Chain
    block: u64,
    nonce: u64,
    receipts: HashMap<TxHash, Receipt>,
    mempool: Vec<(TxHash, TransactionRequest)>,

    // Wallet
    account: Option<Address>,
    authorized: bool,

    // Knobs
    manual_mining: bool,
    reject_authorization: bool,
    reject_signing: bool,
    revert_on_submit: bool,
    failing_reads: u32,
    wallet_unreachable: bool,

    // Counters
    reads: u32,
    submissions: u32,
}

/// Cheap to clone; all clones share one chain.
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<State>>,
}

impl MockChain {
    /// A chain whose wallet holds `ALICE`, not yet authorized.
    pub fn new() -> Self {
        let chain = Self::default();
        chain.state().account = Some(ALICE);
        chain
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Leave transactions in the mempool until [`MockChain::mine`].
    pub fn set_manual_mining(&self, manual: bool) {
        self.state().manual_mining = manual;
    }

    pub fn reject_authorization(&self) {
        self.state().reject_authorization = true;
    }

    pub fn reject_signing(&self, reject: bool) {
        self.state().reject_signing = reject;
    }

    /// Fail submission as a node does when gas estimation reverts.
    pub fn revert_on_submit(&self, revert: bool) {
        self.state().revert_on_submit = revert;
    }

    /// Fail the next `count` reads. `u32::MAX` fails them all.
    pub fn fail_reads(&self, count: u32) {
        self.state().failing_reads = count;
    }

    /// Make the wallet's account listing fail, as when the extension is unreachable.
    pub fn set_wallet_unreachable(&self, unreachable: bool) {
        self.state().wallet_unreachable = unreachable;
    }

    /// Switch the wallet to another, already authorized account.
    pub fn switch_account(&self, account: Address) {
        let mut state = self.state();
        state.account = Some(account);
        state.authorized = true;
    }

    /// Revoke the application's authorization.
    pub fn disconnect(&self) {
        self.state().authorized = false;
    }

    /// Include everything in the mempool in one new block.
    pub fn mine(&self) {
        let mut state = self.state();
        let pending = std::mem::take(&mut state.mempool);
        state.block += 1;
        for (hash, tx) in pending {
            state.execute(hash, tx);
        }
    }

    pub fn balance(&self) -> U256 {
        self.state().balance
    }

    pub fn patient_count(&self) -> u64 {
        self.state().patient_count
    }

    pub fn constructor_arg(&self) -> Option<U256> {
        self.state().constructor_arg
    }

    pub fn reads(&self) -> u32 {
        self.state().reads
    }

    pub fn submissions(&self) -> u32 {
        self.state().submissions
    }

    pub fn pending(&self) -> usize {
        self.state().mempool.len()
    }
}

impl State {
    fn execute(&mut self, hash: TxHash, tx: TransactionRequest) {
        let input = tx.input.input().cloned().unwrap_or_default();
        let from = tx.from.unwrap_or_default();
        let value = tx.value.unwrap_or_default();

        let (success, contract_address) = match tx.to.as_ref().and_then(|kind| kind.to().copied()) {
            None => {
                // Constructor argument is the trailing word of the creation input.
                let arg = input
                    .len()
                    .checked_sub(32)
                    .and_then(|start| U256::abi_decode(&input[start..]).ok());
                self.constructor_arg = arg;
                (arg.is_some(), Some(CONTRACT))
            }
            Some(to) if to == CONTRACT => (self.apply(from, value, &input), None),
            Some(_) => (true, None),
        };

        self.receipts.insert(
            hash,
            Receipt {
                tx_hash: hash,
                block_number: Some(self.block),
                success,
                gas_used: 50_000,
                contract_address,
            },
        );
    }

    /// Run a contract call; false means it reverted and changed nothing.
    fn apply(&mut self, from: Address, value: U256, input: &[u8]) -> bool {
        let Ok(call) = EHRManagementCalls::abi_decode(input) else {
            return false;
        };

        match call {
            EHRManagementCalls::registerPatient(call) => {
                self.patient_count += 1;
                self.patients
                    .insert(self.patient_count, (call.name, call.patientAddress));
                true
            }
            EHRManagementCalls::addRecord(call) => {
                let Ok(id) = u64::try_from(call.patientId) else {
                    return false;
                };
                if !self.patients.contains_key(&id) {
                    return false;
                }
                self.next_record_id += 1;
                let record = EHRManagement::Record {
                    id: U256::from(self.next_record_id),
                    recordData: call.recordData,
                    timestamp: U256::from(GENESIS_TIMESTAMP + self.block * 12),
                    addedBy: from,
                };
                self.records.entry(id).or_default().push(record);
                true
            }
            EHRManagementCalls::deposit(call) => {
                if call.amount != value {
                    return false;
                }
                self.balance += value;
                true
            }
            EHRManagementCalls::withdraw(call) => {
                if call.amount > self.balance {
                    return false;
                }
                self.balance -= call.amount;
                true
            }
            _ => false,
        }
    }

    fn read(&self, input: &[u8]) -> Result<Vec<u8>, String> {
        let call = EHRManagementCalls::abi_decode(input).map_err(|e| e.to_string())?;
        let output = match call {
            EHRManagementCalls::getContractBalance(_) => {
                EHRManagement::getContractBalanceCall::abi_encode_returns(&self.balance)
            }
            EHRManagementCalls::patientCount(_) => {
                EHRManagement::patientCountCall::abi_encode_returns(&U256::from(self.patient_count))
            }
            EHRManagementCalls::getPatientRecords(call) => {
                let records = u64::try_from(call.patientId)
                    .ok()
                    .and_then(|id| self.records.get(&id).cloned())
                    .unwrap_or_default();
                EHRManagement::getPatientRecordsCall::abi_encode_returns(&records)
            }
            _ => return Err("execution reverted: not a view function".to_string()),
        };
        Ok(output)
    }
}

impl Ledger for MockChain {
    async fn call(&self, _from: Address, to: Address, input: Bytes) -> LedgerResult<Bytes> {
        let mut state = self.state();
        state.reads += 1;
        if state.failing_reads > 0 {
            if state.failing_reads != u32::MAX {
                state.failing_reads -= 1;
            }
            return Err(LedgerError::Rpc("connection refused".into()));
        }
        if to != CONTRACT {
            return Ok(Bytes::new());
        }
        state.read(&input).map(Bytes::from).map_err(LedgerError::Rpc)
    }

    async fn receipt(&self, tx_hash: TxHash) -> LedgerResult<Option<Receipt>> {
        Ok(self.state().receipts.get(&tx_hash).cloned())
    }

    async fn block_number(&self) -> LedgerResult<u64> {
        Ok(self.state().block)
    }
}

impl WalletProvider for MockChain {
    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        let state = self.state();
        if state.wallet_unreachable {
            return Err(WalletError::Submission("wallet unreachable".into()));
        }
        Ok(match state.account {
            Some(account) if state.authorized => vec![account],
            _ => vec![],
        })
    }

    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        let mut state = self.state();
        if state.reject_authorization {
            return Err(WalletError::UserRejected("account authorization".into()));
        }
        state.authorized = true;
        Ok(state.account.into_iter().collect())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> WalletResult<TxHash> {
        let mut state = self.state();
        let from = tx.from.unwrap_or_default();
        if !state.authorized || state.account != Some(from) {
            return Err(WalletError::Unauthorized(from));
        }
        if state.reject_signing {
            return Err(WalletError::UserRejected("transaction signature".into()));
        }
        if state.revert_on_submit {
            return Err(WalletError::Reverted("execution reverted".into()));
        }

        state.nonce += 1;
        state.submissions += 1;
        let hash = keccak256(state.nonce.to_be_bytes());
        state.mempool.push((hash, tx));

        if !state.manual_mining {
            let pending = std::mem::take(&mut state.mempool);
            state.block += 1;
            for (hash, tx) in pending {
                state.execute(hash, tx);
            }
        }
        Ok(hash)
    }
}

/// Policies short enough to keep tests fast.
pub fn fast_policies() -> (ConfirmationPolicy, RetryPolicy) {
    (
        ConfirmationPolicy {
            required_confirmations: 1,
            poll_interval: Duration::from_millis(5),
            timeout: Duration::from_millis(200),
        },
        RetryPolicy {
            max_retries: 3,
            base_ms: 1,
            max_ms: 5,
        },
    )
}

pub fn orchestrator(chain: &MockChain) -> TxOrchestrator<MockChain> {
    let (policy, retry) = fast_policies();
    TxOrchestrator::with_policies(Arc::new(chain.clone()), policy, retry, Shutdown::new())
}

/// App over `chain` with the wallet present.
pub fn app(chain: &MockChain) -> EhrApp<MockChain, MockChain> {
    app_with(chain, Some(chain.clone()), &CONTRACT.to_string(), ContractInterface::ehr_management())
}

pub fn app_with(
    chain: &MockChain,
    wallet: Option<MockChain>,
    address: &str,
    interface: ContractInterface,
) -> EhrApp<MockChain, MockChain> {
    EhrApp::new(
        Session::detect(wallet),
        Arc::new(chain.clone()),
        address,
        interface,
        orchestrator(chain),
    )
}

/// An app already connected as `ALICE`.
pub async fn connected_app(chain: &MockChain) -> EhrApp<MockChain, MockChain> {
    let app = app(chain);
    app.connect().await.unwrap();
    app
}
