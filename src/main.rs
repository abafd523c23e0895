//! EHR dApp command-line front end.
//!
//! ```text
//!  ┌──────────────┐   authorize / sign   ┌───────────────┐
//!  │ Wallet       │◀─────────────────────│               │
//!  │ (LocalWallet)│─────── broadcast ───▶│   JSON-RPC    │
//!  └──────┬───────┘                      │     node      │
//!         │ account                      │               │
//!  ┌──────▼───────┐   eth_call/receipts  │               │
//!  │ EhrApp       │─────────────────────▶│               │
//!  │ client       │                      └───────────────┘
//!  │ orchestrator │
//!  │ view ────────┼──▶ JSON on stdout
//!  └──────────────┘
//! ```

use alloy::primitives::U256;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ehr_dapp::config::{load_or_default, EhrConfig};
use ehr_dapp::contract::{parse_amount, Artifact, ContractInterface};
use ehr_dapp::ledger::RpcLedger;
use ehr_dapp::lifecycle::signals::spawn_ctrl_c_handler;
use ehr_dapp::observability::{init_logging, metrics};
use ehr_dapp::orchestrator::TxOrchestrator;
use ehr_dapp::wallet::{LocalWallet, Session};
use ehr_dapp::{deploy, EhrApp, EhrError, Shutdown};

#[derive(Parser)]
#[command(name = "ehr-dapp")]
#[command(about = "Patient registration and medical records on an EHRManagement contract", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show account, contract balance and patient count
    Status,
    /// Register the connected account as a patient
    Register {
        #[arg(long)]
        name: String,
    },
    /// Add a medical record for a patient
    AddRecord {
        #[arg(long)]
        patient_id: String,
        #[arg(long)]
        data: String,
    },
    /// List a patient's records
    Records {
        #[arg(long)]
        patient_id: String,
    },
    /// Deposit ether into the contract
    Deposit {
        #[arg(long)]
        amount: String,
    },
    /// Withdraw ether from the contract
    Withdraw {
        #[arg(long)]
        amount: String,
    },
    /// Deploy the contract from a Hardhat artifact
    Deploy {
        #[arg(long)]
        artifact: PathBuf,
        /// Constructor initBalance in ether; defaults to the configured value
        #[arg(long)]
        initial_balance: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_or_default(cli.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!(
        rpc_url = %config.ledger.rpc_url,
        chain_id = config.ledger.chain_id,
        contract = %config.contract.address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let ledger = Arc::new(RpcLedger::connect(config.ledger.clone()).await?);
    let wallet = LocalWallet::from_env(&config.ledger, &config.wallet)?;
    let session = Session::detect(wallet);

    let shutdown = Shutdown::new();
    spawn_ctrl_c_handler(shutdown.clone());
    let orchestrator = TxOrchestrator::new(ledger.clone(), &config.transactions, shutdown);

    if let Commands::Deploy { artifact, initial_balance } = &cli.command {
        let amount = initial_balance
            .as_deref()
            .unwrap_or(&config.deploy.initial_balance_eth);
        return run_deploy(&session, &orchestrator, artifact, amount).await;
    }

    let interface = contract_interface(&config)?;
    let app = EhrApp::new(session, ledger, config.contract.address.clone(), interface, orchestrator);
    app.connect().await?;

    match cli.command {
        Commands::Status => {
            app.refresh_overview().await?;
            print_json(app.snapshot().as_ref())?;
        }
        Commands::Register { name } => {
            let confirmation = app.register_patient(&name).await?;
            print_outcome(&app, &confirmation)?;
        }
        Commands::AddRecord { patient_id, data } => {
            let confirmation = app.add_record(&patient_id, &data).await?;
            print_outcome(&app, &confirmation)?;
        }
        Commands::Records { patient_id } => {
            let records = app.load_records(&patient_id).await?;
            print_json(&records)?;
        }
        Commands::Deposit { amount } => {
            let confirmation = app.deposit(&amount).await?;
            print_outcome(&app, &confirmation)?;
        }
        Commands::Withdraw { amount } => {
            let confirmation = app.withdraw(&amount).await?;
            print_outcome(&app, &confirmation)?;
        }
        Commands::Deploy { .. } => {}
    }

    Ok(())
}

/// Interface from the configured artifact, or the built-in ABI.
fn contract_interface(config: &EhrConfig) -> Result<ContractInterface, EhrError> {
    match &config.contract.artifact {
        Some(path) => ContractInterface::from_artifact(Path::new(path)),
        None => Ok(ContractInterface::ehr_management()),
    }
}

async fn run_deploy(
    session: &Session<LocalWallet>,
    orchestrator: &TxOrchestrator<RpcLedger>,
    artifact: &Path,
    initial_balance: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let initial_balance: U256 = parse_amount("initial balance", initial_balance)?;
    let artifact = Artifact::load(artifact)?;

    session.request_authorization().await?;
    let deployment = deploy::deploy(session, orchestrator, &artifact, initial_balance).await?;
    print_json(&deployment)?;
    Ok(())
}

fn print_outcome<T: Serialize>(
    app: &EhrApp<LocalWallet, RpcLedger>,
    confirmation: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    #[derive(Serialize)]
    struct Outcome<'a, T> {
        confirmation: &'a T,
        view: &'a ehr_dapp::view::ViewSnapshot,
    }

    let view = app.snapshot();
    print_json(&Outcome {
        confirmation,
        view: view.as_ref(),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
