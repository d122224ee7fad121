//! The end-to-end flows a user walks through.

use crate::utils::{Harness, states};
use alloy_sol_types::SolCall;
use metaswap::{
    Direction, ErrorKind, EventBus, LifecycleEvent, OrchestratorState, Runner, SwapError,
    SwapRequest, TxStatus,
    test_utils::{ALICE, MockChain, MockRemoteSigner, SWAP, TOKEN, ether, undeployed_context},
};
use metaswap_common::contracts::{IMetaSwap, ITestToken};
use metaswap_wallets::{Session, SignerSelector};
use std::sync::Arc;

#[tokio::test]
async fn native_to_token() {
    let h = Harness::new(MockChain::default().with_native(ALICE, ether(10)));
    let mut events = h.runner.bus().subscribe();

    let request = SwapRequest::new(Direction::NativeToToken, "5");
    let outcome = h.swap.submit(&h.external(), &request, None).await.unwrap();

    let sent = h.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, SWAP);
    assert_eq!(sent[0].value, ether(5));
    assert_eq!(sent[0].selector(), Some(IMetaSwap::swapETHToTokenCall::SELECTOR));
    assert_eq!(outcome.transactions[0].status, TxStatus::Confirmed);
    assert_eq!(outcome.balances.native, Some(ether(5)));
    assert_eq!(outcome.balances.token, Some(ether(5000)));

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            LifecycleEvent::State { state, .. } => seen.push(format!("{state:?}")),
            LifecycleEvent::Tx { tx, .. } => seen.push(format!("{:?}", tx.status)),
            LifecycleEvent::Balances { owner, .. } => {
                assert_eq!(owner, ALICE);
                seen.push("Balances".to_string());
            }
        }
    }
    assert_eq!(
        seen,
        [
            "Validating",
            "Executing",
            "Pending",
            "Confirming",
            "Confirmed",
            "Balances",
            "Succeeded",
            "Idle"
        ]
    );
}

#[tokio::test]
async fn token_to_native_approves_then_swaps() {
    let h = Harness::new(MockChain::default().with_token(ALICE, ether(100)));
    let mut events = h.runner.bus().subscribe();

    let request = SwapRequest::new(Direction::TokenToNative, "30");
    h.swap.submit(&h.external(), &request, None).await.unwrap();

    let sent = h.chain.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, TOKEN);
    let approve = ITestToken::approveCall::abi_decode(&sent[0].input).unwrap();
    assert_eq!(approve.amount, ether(30));
    assert_eq!(sent[1].to, SWAP);
    assert!(sent[1].value.is_zero());
    let swap = IMetaSwap::swapTokenToETHCall::abi_decode(&sent[1].input).unwrap();
    assert_eq!(swap.tokenAmount, ether(30));

    assert_eq!(h.chain.token_of(ALICE), ether(70));
    similar_asserts::assert_eq!(
        states(&mut events),
        vec![
            OrchestratorState::Validating,
            OrchestratorState::Approving,
            OrchestratorState::Executing,
            OrchestratorState::Confirming,
            OrchestratorState::Succeeded,
            OrchestratorState::Idle,
        ]
    );
}

#[tokio::test]
async fn undeployed_chain_is_unsupported() {
    let chain = MockChain::default().with_native(ALICE, ether(10)).with_token(ALICE, ether(10));
    let runner = Runner::new(undeployed_context(chain.clone()), EventBus::default());
    let h = Harness::with_runner(chain, runner);

    for direction in [Direction::NativeToToken, Direction::TokenToNative] {
        let request = SwapRequest::new(direction, "1");
        let err = h.swap.submit(&h.external(), &request, None).await.unwrap_err();
        assert!(matches!(err, SwapError::UnsupportedNetwork { .. }), "{err}");
    }
    let err = h.faucet.claim(&h.external()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedNetwork);
    assert_eq!(h.chain.requests(), 0);
}

#[tokio::test]
async fn remote_signer_without_passkey() {
    let h = Harness::new(MockChain::default().with_native(ALICE, ether(10)));
    let remote = Arc::new(MockRemoteSigner::with_passkeys(0));
    let selector = SignerSelector::new().with_remote(remote.clone());
    let mut session = Session::in_memory();
    session.login_remote(ALICE, "user-1", Some("org-1".to_string())).unwrap();

    let err = selector.select(&session, Arc::new(h.chain.clone())).await.unwrap_err();
    let err = SwapError::from(err);
    assert_eq!(err.kind(), ErrorKind::NoPasskeyRegistered);
    assert!(err.kind().is_signer_error());
    assert!(remote.signed().is_empty());
    assert!(h.chain.sent().is_empty());
}
