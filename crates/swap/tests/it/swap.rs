use crate::{
    init_tracing,
    utils::{Harness, states},
};
use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use metaswap::{
    Asset, Direction, ErrorKind, EventBus, LifecycleKind, OrchestratorState, QuoteBoard,
    QuoteEngine, Runner, SwapOrchestrator, SwapRequest, TransferRequest, TxStatus,
    test_utils::{ALICE, BOB, MockChain, SWAP, TOKEN, deployed_context, ether},
};
use metaswap_common::contracts::{IMetaSwap, ITestToken};
use std::time::Duration;

#[tokio::test]
async fn invalid_amounts_make_no_network_call() {
    init_tracing();
    let h = Harness::new(MockChain::default().with_native(ALICE, ether(10)));
    let signer = h.external();

    for amount in ["0", "0.0", "-1", "", "abc", "1e18x"] {
        for direction in [Direction::NativeToToken, Direction::TokenToNative] {
            let request = SwapRequest::new(direction, amount);
            let err = h.swap.submit(&signer, &request, None).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidAmount, "{amount:?}");
        }
    }
    assert_eq!(h.chain.requests(), 0);
    assert!(h.chain.sent().is_empty());
}

#[tokio::test]
async fn amount_above_balance_is_rejected() {
    let chain = MockChain::default().with_native(ALICE, ether(10)).with_token(ALICE, ether(5));
    let h = Harness::new(chain);
    let signer = h.external();

    let request = SwapRequest::new(Direction::NativeToToken, "10.000000000000000001");
    let err = h.swap.submit(&signer, &request, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);

    let request = SwapRequest::new(Direction::TokenToNative, "6");
    let err = h.swap.submit(&signer, &request, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert!(h.chain.sent().is_empty());
}

#[tokio::test]
async fn sufficient_allowance_skips_approval() {
    let chain =
        MockChain::default().with_token(ALICE, ether(100)).with_allowance(ALICE, ether(40));
    let h = Harness::new(chain);
    let mut events = h.runner.bus().subscribe();

    let request = SwapRequest::new(Direction::TokenToNative, "40");
    let outcome = h.swap.submit(&h.external(), &request, None).await.unwrap();

    let sent = h.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].selector(), Some(IMetaSwap::swapTokenToETHCall::SELECTOR));
    assert_eq!(outcome.transactions.len(), 1);
    assert!(!states(&mut events).contains(&OrchestratorState::Approving));
}

#[tokio::test]
async fn short_allowance_approves_exact_amount_once() {
    let chain =
        MockChain::default().with_token(ALICE, ether(100)).with_allowance(ALICE, ether(10));
    let h = Harness::new(chain);

    let request = SwapRequest::new(Direction::TokenToNative, "12.5");
    let outcome = h.swap.submit(&h.external(), &request, None).await.unwrap();

    let sent = h.chain.sent();
    let approvals: Vec<_> = sent
        .iter()
        .filter(|tx| tx.selector() == Some(ITestToken::approveCall::SELECTOR))
        .collect();
    assert_eq!(approvals.len(), 1);
    let approve = ITestToken::approveCall::abi_decode(&approvals[0].input).unwrap();
    assert_eq!(approve.spender, SWAP);
    assert_eq!(approve.amount, ether(25) / U256::from(2));

    let kinds: Vec<_> = outcome.transactions.iter().map(|tx| (tx.kind, tx.status)).collect();
    similar_asserts::assert_eq!(
        kinds,
        vec![
            (LifecycleKind::Approve, TxStatus::Confirmed),
            (LifecycleKind::Swap, TxStatus::Confirmed),
        ]
    );
}

#[tokio::test]
async fn failed_approval_never_swaps() {
    let chain = MockChain::default().with_token(ALICE, ether(100));
    chain.revert_on(ITestToken::approveCall::SELECTOR);
    let h = Harness::new(chain);
    let mut events = h.runner.bus().subscribe();

    let request = SwapRequest::new(Direction::TokenToNative, "30");
    let err = h.swap.submit(&h.external(), &request, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ApprovalFailed);

    let sent = h.chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, TOKEN);
    similar_asserts::assert_eq!(
        states(&mut events),
        vec![
            OrchestratorState::Validating,
            OrchestratorState::Approving,
            OrchestratorState::Failed(ErrorKind::ApprovalFailed),
            OrchestratorState::Idle,
        ]
    );
}

#[tokio::test]
async fn rejected_approval_is_approval_failure() {
    let h = Harness::new(MockChain::default().with_token(ALICE, ether(100)));
    h.wallet.reject_calls_to(ITestToken::approveCall::SELECTOR);

    let request = SwapRequest::new(Direction::TokenToNative, "30");
    let err = h.swap.submit(&h.external(), &request, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ApprovalFailed);
    assert!(h.chain.sent().is_empty());
}

#[tokio::test]
async fn quote_is_only_shown_for_its_input() {
    let h = Harness::new(MockChain::default().with_native(ALICE, ether(10)));
    let engine = QuoteEngine::new(h.runner.context().clone());
    let mut board = QuoteBoard::new(engine.chain_id(), Direction::NativeToToken);

    board.set_amount("2");
    let quote = board.refresh(&engine).await.unwrap();
    assert_eq!(quote.output, ether(2000));
    assert_eq!(board.displayed(), Some(&quote));

    board.set_amount("3");
    assert_eq!(board.displayed(), None);
    // a late answer for the old input is discarded
    assert!(!board.accept(quote));
    assert_eq!(board.displayed(), None);

    // submitting with the outdated quote is refused
    let err = h.swap.submit(&h.external(), &board.request(), Some(&quote)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StaleQuote);

    board.toggle_direction();
    assert_eq!(board.amount(), "");
    assert_eq!(board.displayed(), None);
}

#[tokio::test(start_paused = true)]
async fn one_run_per_account() {
    let chain = MockChain::default().with_native(ALICE, ether(10));
    chain.confirm_after(Duration::from_secs(5));
    let h = Harness::new(chain);
    let signer = h.external();
    let request = SwapRequest::new(Direction::NativeToToken, "1");

    let (first, second) = tokio::join!(
        h.swap.submit(&signer, &request, None),
        h.swap.submit(&signer, &request, None),
    );
    first.unwrap();
    assert_eq!(second.unwrap_err().kind(), ErrorKind::RequestInFlight);
    assert_eq!(h.chain.sent().len(), 1);

    // a transfer shares the slot
    let transfer = TransferRequest::new(Asset::Native, BOB, "1");
    let (swap, transfer) = tokio::join!(
        h.swap.submit(&signer, &request, None),
        h.transfer.submit(&signer, &transfer),
    );
    swap.unwrap();
    assert_eq!(transfer.unwrap_err().kind(), ErrorKind::RequestInFlight);

    // and is free again afterwards
    h.swap.submit(&signer, &request, None).await.unwrap();
    assert_eq!(h.chain.sent().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn receipt_timeout_unblocks_the_user() {
    let chain = MockChain::default().with_native(ALICE, ether(10));
    chain.never_confirm();
    let runner = Runner::new(deployed_context(chain.clone()), EventBus::default())
        .with_tx_timeout(Duration::from_secs(30));
    let h = Harness::with_runner(chain, runner);
    let mut events = h.runner.bus().subscribe();

    let request = SwapRequest::new(Direction::NativeToToken, "1");
    let err = h.swap.submit(&h.external(), &request, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.tx_hash().is_some());
    assert_eq!(states(&mut events).last(), Some(&OrchestratorState::Idle));
}

#[tokio::test]
async fn failed_native_read_aborts_before_dispatch() {
    let chain = MockChain::default().with_native(ALICE, ether(10));
    chain.fail_native_balance(true);
    let h = Harness::new(chain);
    let mut events = h.runner.bus().subscribe();

    let request = SwapRequest::new(Direction::NativeToToken, "1");
    let err = h.swap.submit(&h.external(), &request, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReadFailure);
    assert!(h.chain.sent().is_empty());
    assert!(h.wallet.sent().is_empty());
    assert_eq!(
        states(&mut events),
        [
            OrchestratorState::Validating,
            OrchestratorState::Failed(ErrorKind::ReadFailure),
            OrchestratorState::Idle,
        ]
    );
    assert!(!h.runner.in_flight().is_busy(ALICE));
}

#[tokio::test]
async fn failed_allowance_read_aborts_before_approval() {
    let chain = MockChain::default().with_token(ALICE, ether(100));
    chain.fail_allowance(true);
    let h = Harness::new(chain);
    let mut events = h.runner.bus().subscribe();

    let request = SwapRequest::new(Direction::TokenToNative, "40");
    let err = h.swap.submit(&h.external(), &request, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReadFailure);
    assert!(h.chain.sent().is_empty());
    let states = states(&mut events);
    assert_eq!(
        states[states.len() - 2..],
        [OrchestratorState::Failed(ErrorKind::ReadFailure), OrchestratorState::Idle]
    );
    assert!(!states.contains(&OrchestratorState::Approving));
    assert!(!h.runner.in_flight().is_busy(ALICE));

    // the slot is free for a retry once the node answers again
    h.chain.fail_allowance(false);
    h.swap.submit(&h.external(), &request, None).await.unwrap();
}

#[tokio::test]
async fn successful_swap_clears_the_board() {
    let h = Harness::new(MockChain::default().with_native(ALICE, ether(10)));
    let engine = QuoteEngine::new(h.runner.context().clone());
    let mut board = QuoteBoard::new(engine.chain_id(), Direction::NativeToToken);
    board.set_amount("2");
    board.refresh(&engine).await.unwrap();

    let outcome = h.swap.submit_board(&h.external(), &mut board).await.unwrap();
    assert!(outcome.tx_hash().is_some());
    assert_eq!(h.chain.token_of(ALICE), ether(2000));
    assert_eq!(board.amount(), "");
    assert_eq!(board.displayed(), None);
    assert_eq!(board.direction(), Direction::NativeToToken);
}

#[tokio::test]
async fn failed_swap_keeps_the_board() {
    let h = Harness::new(MockChain::default().with_native(ALICE, ether(10)));
    h.chain.revert_on(IMetaSwap::swapETHToTokenCall::SELECTOR);
    let engine = QuoteEngine::new(h.runner.context().clone());
    let mut board = QuoteBoard::new(engine.chain_id(), Direction::NativeToToken);
    board.set_amount("2");
    let quote = board.refresh(&engine).await.unwrap();

    let err = h.swap.submit_board(&h.external(), &mut board).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SwapExecutionFailed);
    assert_eq!(board.amount(), "2");
    assert_eq!(board.displayed(), Some(&quote));
}

#[tokio::test(start_paused = true)]
async fn derived_runners_share_the_in_flight_registry() {
    let chain = MockChain::default().with_native(ALICE, ether(10));
    chain.confirm_after(Duration::from_secs(5));
    let runner = Runner::new(deployed_context(chain.clone()), EventBus::default());
    let other_chain = MockChain::default().with_native(ALICE, ether(10));
    let switched = runner.with_context(deployed_context(other_chain.clone()));
    let h = Harness::with_runner(chain, runner);
    let on_switched = SwapOrchestrator::new(switched.clone());
    let request = SwapRequest::new(Direction::NativeToToken, "1");

    let (signer, switched_signer) = (h.external(), h.external());
    let (first, second) = tokio::join!(
        h.swap.submit(&signer, &request, None),
        on_switched.submit(&switched_signer, &request, None),
    );
    first.unwrap();
    assert_eq!(second.unwrap_err().kind(), ErrorKind::RequestInFlight);
    assert!(other_chain.sent().is_empty());
    assert!(!switched.in_flight().is_busy(ALICE));
}
