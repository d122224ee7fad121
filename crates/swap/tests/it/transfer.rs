use crate::utils::Harness;
use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use metaswap::{
    Asset, ErrorKind, LifecycleKind, TransferRequest,
    test_utils::{ALICE, BOB, MockChain, MockRemoteSigner, ether, faucet_amount},
};
use metaswap_common::contracts::ITestToken;
use metaswap_wallets::{Session, SignerSelector};
use std::sync::Arc;

#[tokio::test]
async fn faucet_then_send_token() {
    let h = Harness::new(MockChain::default());
    let signer = h.external();

    let outcome = h.faucet.claim(&signer).await.unwrap();
    assert_eq!(outcome.transactions[0].kind, LifecycleKind::Faucet);
    assert_eq!(outcome.balances.token, Some(faucet_amount()));

    let request = TransferRequest::new(Asset::Token, BOB, "25");
    let outcome = h.transfer.submit(&signer, &request).await.unwrap();
    assert_eq!(outcome.transactions[0].kind, LifecycleKind::Transfer);
    assert_eq!(h.chain.token_of(BOB), ether(25));
    assert_eq!(outcome.balances.token, Some(ether(75)));
}

#[tokio::test]
async fn remote_signer_sends_native() {
    let h = Harness::new(MockChain::default().with_native(ALICE, ether(2)));
    let remote = Arc::new(MockRemoteSigner::with_passkeys(2));
    let mut session = Session::in_memory();
    session.login_remote(ALICE, "user-1", Some("org-1".to_string())).unwrap();
    let signer = SignerSelector::new()
        .with_remote(remote.clone())
        .select(&session, Arc::new(h.chain.clone()))
        .await
        .unwrap();

    let request = TransferRequest::new(Asset::Native, BOB, "0.5");
    h.transfer.submit(&signer, &request).await.unwrap();
    assert_eq!(h.chain.native_of(BOB), ether(1) / U256::from(2));
    let signed = remote.signed();
    assert_eq!(signed.len(), 1);
    // filled in by the chain before signing
    assert!(signed[0].nonce.is_some() && signed[0].gas.is_some());
}

#[tokio::test]
async fn rejected_transfer() {
    let h = Harness::new(MockChain::default().with_token(ALICE, ether(5)));
    h.wallet.reject_calls_to(ITestToken::transferCall::SELECTOR);

    let request = TransferRequest::new(Asset::Token, BOB, "5");
    let err = h.transfer.submit(&h.external(), &request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderRejected);
    assert_eq!(h.chain.token_of(ALICE), ether(5));
}
