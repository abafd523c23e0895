//! End-to-end flows through session, client, orchestrator and view.

use alloy::primitives::U256;
use ehr_dapp::contract::{Artifact, ContractInterface};
use ehr_dapp::deploy::deploy;
use ehr_dapp::orchestrator::TxState;
use ehr_dapp::wallet::Session;
use ehr_dapp::EhrError;

mod common;

use common::{eth, MockChain, ALICE, BOB, CONTRACT};

#[tokio::test]
async fn test_register_increments_patient_count() {
    let chain = MockChain::new();
    let app = common::connected_app(&chain).await;

    assert_eq!(app.refresh_patient_count().await.unwrap(), 0);
    assert_eq!(app.snapshot().patient_count, Some(0));

    let confirmation = app.register_patient("Alice").await.unwrap();
    assert!(matches!(confirmation.transaction.state, TxState::Confirmed { .. }));
    assert_eq!(confirmation.transaction.arguments[0], "Alice");
    assert!(!confirmation.view_stale);

    assert_eq!(app.snapshot().patient_count, Some(1));
    assert_eq!(app.refresh_patient_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_records_empty_then_added() {
    let chain = MockChain::new();
    let app = common::connected_app(&chain).await;
    app.register_patient("Alice").await.unwrap();

    assert!(app.load_records("1").await.unwrap().is_empty());

    app.add_record("1", "note").await.unwrap();

    let snapshot = app.snapshot();
    let loaded = snapshot.records.as_ref().unwrap();
    assert_eq!(loaded.patient_id.get(), 1);
    assert_eq!(loaded.records.len(), 1);
    assert_eq!(loaded.records[0].data, "note");
    assert_eq!(loaded.records[0].added_by, ALICE);

    // Leading zeros name the same patient.
    assert_eq!(app.load_records("001").await.unwrap(), loaded.records);
}

#[tokio::test]
async fn test_missing_provider_never_binds() {
    let chain = MockChain::new();
    let app = common::app_with(&chain, None, &CONTRACT.to_string(), ContractInterface::ehr_management());

    assert_eq!(app.init().await.unwrap(), None);
    assert!(matches!(app.connect().await, Err(EhrError::NoProviderFound)));
    assert!(app.client().is_none());
    assert!(matches!(app.register_patient("Alice").await, Err(EhrError::NoProviderFound)));
    assert_eq!(chain.submissions(), 0);
}

#[tokio::test]
async fn test_init_does_not_prompt() {
    let chain = MockChain::new();
    let app = common::app(&chain);

    // Not yet authorized: no account, no client.
    assert_eq!(app.init().await.unwrap(), None);
    assert!(app.client().is_none());
    assert!(matches!(app.refresh_balance().await, Err(EhrError::SignerUnavailable)));

    app.connect().await.unwrap();

    // A fresh app on the same wallet picks the account up silently.
    let reopened = common::app(&chain);
    assert_eq!(reopened.init().await.unwrap(), Some(ALICE));
    assert_eq!(reopened.client().unwrap().account(), ALICE);
}

#[tokio::test]
async fn test_deposit_withdraw_round_trip() {
    let chain = MockChain::new();
    let app = common::connected_app(&chain).await;
    let before = app.refresh_balance().await.unwrap();

    app.deposit("1.5").await.unwrap();
    assert_eq!(app.snapshot().balance, Some(before + eth(3) / U256::from(2u64)));

    app.withdraw("1.5").await.unwrap();
    assert_eq!(app.snapshot().balance, Some(before));
    assert_eq!(chain.balance(), before);
}

#[tokio::test]
async fn test_amounts_are_reported_in_ether() {
    let chain = MockChain::new();
    let app = common::connected_app(&chain).await;

    let deposit = app.deposit("1.5").await.unwrap();
    assert_eq!(deposit.transaction.arguments, vec!["1.5".to_string()]);

    let withdrawal = app.withdraw("0.25").await.unwrap();
    assert_eq!(withdrawal.transaction.arguments, vec!["0.25".to_string()]);

    let rendered = serde_json::to_value(app.snapshot().as_ref()).unwrap();
    assert_eq!(rendered["balance_eth"], "1.25");
}

#[tokio::test]
async fn test_concurrent_deposits_are_independent() {
    let chain = MockChain::new();
    let app = common::connected_app(&chain).await;

    let (first, second) = tokio::join!(app.deposit("1"), app.deposit("2"));
    let first = first.unwrap();
    let second = second.unwrap();

    assert_ne!(first.transaction.id, second.transaction.id);
    assert_ne!(first.transaction.tx_hash, second.transaction.tx_hash);
    assert_eq!(chain.submissions(), 2);
    assert_eq!(chain.balance(), eth(3));
    assert_eq!(app.snapshot().balance, Some(eth(3)));
}

#[tokio::test]
async fn test_account_change_rebinds_client() {
    let chain = MockChain::new();
    let app = common::connected_app(&chain).await;
    app.deposit("1").await.unwrap();
    assert_eq!(app.snapshot().account, Some(ALICE));

    chain.switch_account(BOB);
    assert_eq!(app.sync_account().await.unwrap(), Some(BOB));

    let snapshot = app.snapshot();
    assert_eq!(snapshot.account, Some(BOB));
    assert_eq!(snapshot.balance, None);
    assert_eq!(app.client().unwrap().account(), BOB);

    app.register_patient("Bob").await.unwrap();
    app.add_record("1", "signed by bob").await.unwrap();
    let records = app.load_records("1").await.unwrap();
    assert_eq!(records[0].added_by, BOB);
}

#[tokio::test]
async fn test_revoked_account_drops_client() {
    let chain = MockChain::new();
    let app = common::connected_app(&chain).await;

    chain.disconnect();
    assert_eq!(app.sync_account().await.unwrap(), None);
    assert!(app.client().is_none());
    assert_eq!(app.snapshot().account, None);
}

#[tokio::test]
async fn test_invalid_contract_address() {
    let chain = MockChain::new();
    let app = common::app_with(&chain, Some(chain.clone()), "0x123", ContractInterface::ehr_management());

    assert!(matches!(app.connect().await, Err(EhrError::InvalidAddress(_))));
    assert!(app.client().is_none());
}

#[tokio::test]
async fn test_interface_mismatch() {
    let chain = MockChain::new();
    let interface = ContractInterface::from_signatures(["patientCount()", "getContractBalance()"]);
    let app = common::app_with(&chain, Some(chain.clone()), &CONTRACT.to_string(), interface);

    match app.connect().await {
        Err(EhrError::InterfaceMismatch(missing)) => {
            assert!(missing.contains(&"deposit(uint256)".to_string()));
        }
        other => panic!("expected interface mismatch, got {:?}", other.map(|_| ())),
    }
    assert!(app.client().is_none());
}

#[tokio::test]
async fn test_deploy_passes_initial_balance_as_argument() {
    let chain = MockChain::new();
    let session = Session::detect(Some(chain.clone()));
    session.request_authorization().await.unwrap();

    let artifact = Artifact::parse(
        r#"{"contractName": "EHRManagement", "abi": [], "bytecode": "0x6080604052"}"#,
    )
    .unwrap();

    let deployment = deploy(&session, &common::orchestrator(&chain), &artifact, eth(1))
        .await
        .unwrap();

    assert_eq!(deployment.address, CONTRACT);
    assert_eq!(deployment.initial_balance, eth(1));
    assert_eq!(chain.constructor_arg(), Some(eth(1)));
    // No value is attached to the creation transaction.
    assert_eq!(chain.balance(), U256::ZERO);
}
