//! One-shot contract deployment.
//!
//! The constructor takes a single `uint256 initBalance`. Its meaning is
//! defined by the contract, so the amount is passed as an argument only
//! and no value is attached to the creation transaction.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolValue;
use serde::Serialize;

use crate::contract::{format_amount, Artifact};
use crate::error::EhrError;
use crate::ledger::Ledger;
use crate::orchestrator::{submit_transaction, Action, TxOrchestrator};
use crate::wallet::{Session, WalletProvider};

/// Where the contract landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployment {
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Constructor argument, in wei.
    pub initial_balance: U256,
}

/// Creation code followed by the ABI-encoded constructor argument.
pub fn deployment_code(artifact: &Artifact, initial_balance: U256) -> Result<Bytes, EhrError> {
    let code = artifact.creation_code()?;
    let mut input = code.to_vec();
    input.extend_from_slice(&initial_balance.abi_encode());
    Ok(input.into())
}

/// Deploy `artifact` from the session's account and wait for confirmation.
pub async fn deploy<W: WalletProvider, L: Ledger>(
    session: &Session<W>,
    orchestrator: &TxOrchestrator<L>,
    artifact: &Artifact,
    initial_balance: U256,
) -> Result<Deployment, EhrError> {
    let input = deployment_code(artifact, initial_balance)?;
    let (wallet, account) = session.signer()?;

    let tx = TransactionRequest::default()
        .with_from(account)
        .with_deploy_code(input);

    tracing::info!(
        contract = %artifact.contract_name,
        account = %account,
        initial_balance = %format_amount(initial_balance),
        "Deploying contract"
    );

    let confirmation = orchestrator
        .execute(
            Action::Deploy,
            submit_transaction(wallet.as_ref(), Action::Deploy, vec![format_amount(initial_balance)], tx),
            || async { Ok(()) },
        )
        .await?;

    let receipt = confirmation.receipt;
    let address = receipt.contract_address.ok_or_else(|| EhrError::SubmissionFailed {
        action: Action::Deploy,
        reason: format!("receipt for {} has no contract address", receipt.tx_hash),
    })?;

    tracing::info!(address = %address, tx_hash = %receipt.tx_hash, "Contract deployed");
    Ok(Deployment {
        address,
        tx_hash: receipt.tx_hash,
        block_number: receipt.block_number,
        initial_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_argument_appended() {
        let artifact = Artifact::parse(r#"{"contractName": "EHRManagement", "abi": [], "bytecode": "0x6080"}"#).unwrap();
        let code = deployment_code(&artifact, U256::from(1u64)).unwrap();

        assert_eq!(code.len(), 2 + 32);
        assert_eq!(&code[..2], &[0x60, 0x80]);
        assert_eq!(code[33], 1);
    }
}
