//! Application façade.
//!
//! # Data Flow
//! ```text
//! Session (authorized account)
//!     → ContractClient (bound per account)
//!     → TxOrchestrator (submit, confirm)
//!     → ViewState (refresh after confirmation)
//! ```
//!
//! # Invariants
//! - No client exists while the session has no account
//! - An account change drops the old client and resets the view
//! - The view only changes through reads that completed successfully

use alloy::primitives::{Address, U256};
use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::contract::types::require_text;
use crate::contract::{parse_amount, ContractClient, ContractInterface, PatientId, Record};
use crate::error::EhrError;
use crate::ledger::Ledger;
use crate::orchestrator::{Action, Confirmation, TxOrchestrator};
use crate::view::{ViewField, ViewSnapshot, ViewState};
use crate::wallet::{Session, WalletProvider};

pub struct EhrApp<W, L> {
    session: Session<W>,
    ledger: Arc<L>,
    contract_address: String,
    interface: Arc<ContractInterface>,
    client: ArcSwapOption<ContractClient<W, L>>,
    orchestrator: TxOrchestrator<L>,
    view: ViewState,
}

impl<W: WalletProvider, L: Ledger> EhrApp<W, L> {
    pub fn new(
        session: Session<W>,
        ledger: Arc<L>,
        contract_address: impl Into<String>,
        interface: ContractInterface,
        orchestrator: TxOrchestrator<L>,
    ) -> Self {
        Self {
            session,
            ledger,
            contract_address: contract_address.into(),
            interface: Arc::new(interface),
            client: ArcSwapOption::empty(),
            orchestrator,
            view: ViewState::new(),
        }
    }

    pub fn session(&self) -> &Session<W> {
        &self.session
    }

    pub fn orchestrator(&self) -> &TxOrchestrator<L> {
        &self.orchestrator
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn snapshot(&self) -> Arc<ViewSnapshot> {
        self.view.snapshot()
    }

    /// The bound client, if an account is authorized.
    pub fn client(&self) -> Option<Arc<ContractClient<W, L>>> {
        self.client.load_full()
    }

    /// Pick up an already-authorized account without prompting.
    pub async fn init(&self) -> Result<Option<Address>, EhrError> {
        if !self.session.detect_provider() {
            tracing::info!("No wallet provider detected");
            return Ok(None);
        }
        self.sync_account().await
    }

    /// Ask the wallet for an account and bind the contract to it.
    pub async fn connect(&self) -> Result<Address, EhrError> {
        let account = self.session.request_authorization().await?;
        self.bind_account(account)?;
        Ok(account)
    }

    /// Re-read the wallet's account and rebind if it changed.
    pub async fn sync_account(&self) -> Result<Option<Address>, EhrError> {
        // A failed read is not a revocation; the client stays bound.
        match self.session.current_account().await? {
            Some(account) => {
                self.bind_account(account)?;
                Ok(Some(account))
            }
            None => {
                if self.client.swap(None).is_some() {
                    tracing::info!("Wallet account revoked, contract client dropped");
                    self.view.reset_for_account(None);
                }
                Ok(None)
            }
        }
    }

    fn bind_account(&self, account: Address) -> Result<(), EhrError> {
        if let Some(current) = self.client.load_full() {
            if current.account() == account {
                return Ok(());
            }
            tracing::info!(previous = %current.account(), account = %account, "Wallet account changed");
        }

        self.client.store(None);
        self.view.reset_for_account(Some(account));

        let client = ContractClient::bind(
            &self.contract_address,
            self.interface.clone(),
            &self.session,
            self.ledger.clone(),
        )?;
        self.client.store(Some(Arc::new(client)));
        Ok(())
    }

    fn require_client(&self) -> Result<Arc<ContractClient<W, L>>, EhrError> {
        self.client.load_full().ok_or(if self.session.detect_provider() {
            EhrError::SignerUnavailable
        } else {
            EhrError::NoProviderFound
        })
    }

    pub async fn refresh_balance(&self) -> Result<U256, EhrError> {
        let client = self.require_client()?;
        let ticket = self.view.ticket(ViewField::Balance);
        let balance = client.query_balance().await?;
        self.view.set_balance(ticket, balance);
        Ok(balance)
    }

    pub async fn refresh_patient_count(&self) -> Result<u64, EhrError> {
        let client = self.require_client()?;
        let ticket = self.view.ticket(ViewField::PatientCount);
        let count = client.query_patient_count().await?;
        self.view.set_patient_count(ticket, count);
        Ok(count)
    }

    /// Load a patient's records into the view. `patient_id` is user input.
    pub async fn load_records(&self, patient_id: &str) -> Result<Vec<Record>, EhrError> {
        let patient_id = PatientId::parse(patient_id)?;
        self.refresh_records(patient_id).await
    }

    async fn refresh_records(&self, patient_id: PatientId) -> Result<Vec<Record>, EhrError> {
        let client = self.require_client()?;
        let ticket = self.view.ticket(ViewField::Records);
        let records = client.query_records(patient_id).await?;
        self.view.set_records(ticket, patient_id, records.clone());
        Ok(records)
    }

    /// Refresh balance and patient count together.
    pub async fn refresh_overview(&self) -> Result<Arc<ViewSnapshot>, EhrError> {
        let (balance, count) = tokio::join!(self.refresh_balance(), self.refresh_patient_count());
        balance?;
        count?;
        Ok(self.view.snapshot())
    }

    /// Register the connected account as patient `name`.
    pub async fn register_patient(&self, name: &str) -> Result<Confirmation, EhrError> {
        require_text("name", name)?;
        let client = self.require_client()?;
        let app = self;

        self.orchestrator
            .execute(
                Action::RegisterPatient,
                client.submit_register_patient(name, client.account()),
                move || async move { app.refresh_patient_count().await.map(|_| ()) },
            )
            .await
    }

    pub async fn add_record(&self, patient_id: &str, data: &str) -> Result<Confirmation, EhrError> {
        let patient_id = PatientId::parse(patient_id)?;
        require_text("record data", data)?;
        let client = self.require_client()?;
        let app = self;

        self.orchestrator
            .execute(
                Action::AddRecord,
                client.submit_add_record(patient_id, data),
                move || async move { app.refresh_records(patient_id).await.map(|_| ()) },
            )
            .await
    }

    /// Deposit `amount` ether into the contract.
    pub async fn deposit(&self, amount: &str) -> Result<Confirmation, EhrError> {
        let amount = parse_amount("amount", amount)?;
        let client = self.require_client()?;
        let app = self;

        self.orchestrator
            .execute(
                Action::Deposit,
                client.submit_deposit(amount),
                move || async move { app.refresh_balance().await.map(|_| ()) },
            )
            .await
    }

    /// Withdraw `amount` ether from the contract.
    pub async fn withdraw(&self, amount: &str) -> Result<Confirmation, EhrError> {
        let amount = parse_amount("amount", amount)?;
        let client = self.require_client()?;
        let app = self;

        self.orchestrator
            .execute(
                Action::Withdraw,
                client.submit_withdraw(amount),
                move || async move { app.refresh_balance().await.map(|_| ()) },
            )
            .await
    }
}

impl<W, L> std::fmt::Debug for EhrApp<W, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EhrApp")
            .field("session", &self.session)
            .field("contract_address", &self.contract_address)
            .field("view", &self.view)
            .finish()
    }
}
