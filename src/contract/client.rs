//! Contract client bound to one address and one signing account.
//!
//! # Responsibilities
//! - Refuse to exist without an authorized account
//! - Encode reads as `eth_call` against the ledger and decode the results
//! - Encode writes and hand them to the wallet for signing
//!
//! A client is tied to the account it was bound with. When the session
//! account changes, bind a new one.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use std::sync::Arc;

use crate::contract::abi::EHRManagement;
use crate::contract::interface::ContractInterface;
use crate::contract::types::{format_amount, require_text, PatientId, Record};
use crate::error::EhrError;
use crate::ledger::Ledger;
use crate::observability::metrics;
use crate::orchestrator::transaction::{submit_transaction, Action, PendingTransaction};
use crate::wallet::{Session, WalletProvider};

/// Typed handle on a deployed `EHRManagement` contract.
pub struct ContractClient<W, L> {
    address: Address,
    interface: Arc<ContractInterface>,
    account: Address,
    wallet: Arc<W>,
    ledger: Arc<L>,
}

impl<W: WalletProvider, L: Ledger> ContractClient<W, L> {
    /// Bind `address` to the session's authorized account.
    pub fn bind(
        address: &str,
        interface: Arc<ContractInterface>,
        session: &Session<W>,
        ledger: Arc<L>,
    ) -> Result<Self, EhrError> {
        let address = parse_contract_address(address)?;
        let (wallet, account) = session.signer()?;

        let missing = interface.missing();
        if !missing.is_empty() {
            return Err(EhrError::InterfaceMismatch(missing));
        }

        tracing::debug!(contract = %address, account = %account, "Contract client bound");
        Ok(Self {
            address,
            interface,
            account,
            wallet,
            ledger,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Account every write is signed by.
    pub fn account(&self) -> Address {
        self.account
    }

    pub fn interface(&self) -> &ContractInterface {
        &self.interface
    }

    /// Contract balance in wei.
    pub async fn query_balance(&self) -> Result<U256, EhrError> {
        self.read("balance", EHRManagement::getContractBalanceCall {}).await
    }

    pub async fn query_patient_count(&self) -> Result<u64, EhrError> {
        let count = self.read("patient_count", EHRManagement::patientCountCall {}).await?;
        u64::try_from(count).map_err(|_| EhrError::ReadFailed {
            query: "patient_count",
            reason: format!("patient count {} overflows u64", count),
        })
    }

    /// Records of `patient_id`, oldest first.
    pub async fn query_records(&self, patient_id: PatientId) -> Result<Vec<Record>, EhrError> {
        let call = EHRManagement::getPatientRecordsCall {
            patientId: patient_id.into(),
        };
        let raw = self.read("records", call).await?;

        raw.into_iter()
            .map(Record::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| EhrError::ReadFailed {
                query: "records",
                reason,
            })
    }

    pub async fn submit_register_patient(
        &self,
        name: &str,
        account: Address,
    ) -> Result<PendingTransaction, EhrError> {
        require_text("name", name)?;
        let call = EHRManagement::registerPatientCall {
            name: name.to_string(),
            patientAddress: account,
        };
        self.write(
            Action::RegisterPatient,
            vec![name.to_string(), account.to_string()],
            call,
            None,
        )
        .await
    }

    pub async fn submit_add_record(
        &self,
        patient_id: PatientId,
        data: &str,
    ) -> Result<PendingTransaction, EhrError> {
        require_text("record data", data)?;
        let call = EHRManagement::addRecordCall {
            patientId: patient_id.into(),
            recordData: data.to_string(),
        };
        self.write(
            Action::AddRecord,
            vec![patient_id.to_string(), data.to_string()],
            call,
            None,
        )
        .await
    }

    /// Deposit `amount` wei. The same amount is attached as value.
    pub async fn submit_deposit(&self, amount: U256) -> Result<PendingTransaction, EhrError> {
        require_positive(amount)?;
        let call = EHRManagement::depositCall { amount };
        self.write(Action::Deposit, vec![format_amount(amount)], call, Some(amount))
            .await
    }

    pub async fn submit_withdraw(&self, amount: U256) -> Result<PendingTransaction, EhrError> {
        require_positive(amount)?;
        let call = EHRManagement::withdrawCall { amount };
        self.write(Action::Withdraw, vec![format_amount(amount)], call, None)
            .await
    }

    async fn read<C: SolCall>(&self, query: &'static str, call: C) -> Result<C::Return, EhrError> {
        let result = self
            .ledger
            .call(self.account, self.address, call.abi_encode().into())
            .await
            .map_err(|e| e.to_string())
            .and_then(|output| C::abi_decode_returns(&output).map_err(|e| e.to_string()));

        metrics::record_read(query, result.is_ok());
        result.map_err(|reason| {
            tracing::warn!(query = query, contract = %self.address, error = %reason, "Contract read failed");
            EhrError::ReadFailed { query, reason }
        })
    }

    async fn write<C: SolCall>(
        &self,
        action: Action,
        arguments: Vec<String>,
        call: C,
        value: Option<U256>,
    ) -> Result<PendingTransaction, EhrError> {
        let mut tx = TransactionRequest::default()
            .with_from(self.account)
            .with_to(self.address)
            .with_input(call.abi_encode());
        if let Some(value) = value {
            tx = tx.with_value(value);
        }

        submit_transaction(self.wallet.as_ref(), action, arguments, tx).await
    }
}

impl<W, L> std::fmt::Debug for ContractClient<W, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractClient")
            .field("address", &self.address)
            .field("account", &self.account)
            .finish()
    }
}

/// Parse a non-zero contract address.
pub fn parse_contract_address(input: &str) -> Result<Address, EhrError> {
    let address: Address = input
        .trim()
        .parse()
        .map_err(|_| EhrError::InvalidAddress(input.to_string()))?;
    if address.is_zero() {
        return Err(EhrError::InvalidAddress(input.to_string()));
    }
    Ok(address)
}

fn require_positive(amount: U256) -> Result<(), EhrError> {
    if amount.is_zero() {
        return Err(EhrError::invalid("amount", "must be greater than zero"));
    }
    Ok(())
}
