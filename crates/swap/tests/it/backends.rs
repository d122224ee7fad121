use crate::utils::Harness;
use metaswap::{
    Direction, ErrorKind, SwapError, SwapRequest, TxStatus,
    test_utils::{ALICE, MockChain, MockInjected, MockRemoteSigner, ether},
};
use metaswap_wallets::{Backend, Session, SignerSelector, WalletSignerError};
use std::{sync::Arc, time::Duration};

fn remote_session() -> Session {
    let mut session = Session::in_memory();
    session.login_remote(ALICE, "user-1", Some("org-1".to_string())).unwrap();
    session
}

#[tokio::test]
async fn remote_signer_swaps() {
    let h = Harness::new(MockChain::default().with_native(ALICE, ether(10)));
    let remote = Arc::new(MockRemoteSigner::with_passkeys(1));
    let selector = SignerSelector::new().with_remote(remote.clone());

    let signer = selector.select(&remote_session(), Arc::new(h.chain.clone())).await.unwrap();
    assert_eq!(signer.backend(), Backend::RemoteSigner);

    let request = SwapRequest::new(Direction::NativeToToken, "2");
    let outcome = h.swap.submit(&signer, &request, None).await.unwrap();
    assert_eq!(remote.signed().len(), 1);
    assert_eq!(h.chain.token_of(ALICE), ether(2000));
    assert_eq!(outcome.tx_hash(), Some(h.chain.sent()[0].hash));
    // the injected wallet was never involved
    assert!(h.wallet.sent().is_empty());
}

#[tokio::test]
async fn connected_wallet_takes_precedence() {
    let h = Harness::new(MockChain::default().with_native(ALICE, ether(10)));
    let remote = Arc::new(MockRemoteSigner::with_passkeys(1));
    let selector =
        SignerSelector::new().with_injected(h.wallet.clone()).with_remote(remote.clone());

    let signer = selector.select(&remote_session(), Arc::new(h.chain.clone())).await.unwrap();
    assert_eq!(signer.backend(), Backend::ExternalWallet);
    assert_eq!(remote.authenticator_queries(), 0);
}

#[tokio::test(start_paused = true)]
async fn switching_backend_mid_flow_keeps_the_running_transaction() {
    crate::init_tracing();
    let chain = MockChain::default().with_native(ALICE, ether(10));
    chain.confirm_after(Duration::from_secs(10));
    let h = Harness::new(chain);
    let remote = Arc::new(MockRemoteSigner::with_passkeys(1));
    let wallet = Arc::new(MockInjected::new(Vec::new()).on_chain(h.chain.clone()));
    let selector = SignerSelector::new().with_injected(wallet.clone()).with_remote(remote.clone());
    let session = remote_session();

    let signer = selector.select(&session, Arc::new(h.chain.clone())).await.unwrap();
    assert_eq!(signer.backend(), Backend::RemoteSigner);
    let request = SwapRequest::new(Direction::NativeToToken, "1");

    let (outcome, during) = tokio::join!(h.swap.submit(&signer, &request, None), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        // the extension connects while the swap is confirming
        wallet.connect(ALICE);
        let external = selector.select(&session, Arc::new(h.chain.clone())).await.unwrap();
        assert_eq!(external.backend(), Backend::ExternalWallet);
        assert!(h.runner.in_flight().is_busy(ALICE));
        h.swap.submit(&external, &request, None).await
    });

    let outcome = outcome.unwrap();
    assert_eq!(outcome.transactions.len(), 1);
    assert_eq!(outcome.transactions[0].status, TxStatus::Confirmed);
    assert_eq!(outcome.tx_hash(), Some(h.chain.sent()[0].hash));
    assert_eq!(remote.signed().len(), 1);
    assert_eq!(during.unwrap_err().kind(), ErrorKind::RequestInFlight);
    assert!(wallet.sent().is_empty());

    // the next operation goes through the wallet
    let external = selector.select(&session, Arc::new(h.chain.clone())).await.unwrap();
    h.swap.submit(&external, &request, None).await.unwrap();
    assert_eq!(wallet.sent().len(), 1);
    assert_eq!(remote.signed().len(), 1);
}

#[tokio::test]
async fn unknown_organization_needs_login() {
    let h = Harness::new(MockChain::default());
    let remote = Arc::new(MockRemoteSigner::with_passkeys(1));
    let selector = SignerSelector::new().with_remote(remote.clone());
    let mut session = Session::in_memory();
    session.login_remote(ALICE, "user-1", None).unwrap();

    let err = selector.select(&session, Arc::new(h.chain.clone())).await.unwrap_err();
    assert!(matches!(err, WalletSignerError::MissingAuthContext { address } if address == ALICE));
    assert_eq!(SwapError::from(err).kind(), ErrorKind::MissingAuthContext);
    assert_eq!(remote.authenticator_queries(), 0);
}

#[tokio::test]
async fn no_backend_at_all() {
    let h = Harness::new(MockChain::default());
    let selector = SignerSelector::new().with_injected(Arc::new(MockInjected::new(Vec::new())));

    let err = selector.select(&remote_session(), Arc::new(h.chain.clone())).await.unwrap_err();
    assert_eq!(SwapError::from(err).kind(), ErrorKind::SignerUnavailable);
}
