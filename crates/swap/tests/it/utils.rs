use metaswap::{
    EventBus, FaucetOrchestrator, LifecycleEvent, OrchestratorState, Runner, SwapOrchestrator,
    TransferOrchestrator,
    test_utils::{ALICE, MockChain, MockInjected, deployed_context},
};
use metaswap_wallets::WalletSigner;
use std::sync::Arc;
use tokio::sync::broadcast;

/// The orchestrators of one session, sharing a runner.
pub struct Harness {
    pub chain: MockChain,
    pub wallet: Arc<MockInjected>,
    pub runner: Runner,
    pub swap: SwapOrchestrator,
    pub transfer: TransferOrchestrator,
    pub faucet: FaucetOrchestrator,
}

impl Harness {
    pub fn new(chain: MockChain) -> Self {
        Self::with_runner(chain.clone(), Runner::new(deployed_context(chain), EventBus::default()))
    }

    pub fn with_runner(chain: MockChain, runner: Runner) -> Self {
        let wallet = Arc::new(MockInjected::new(vec![ALICE]).on_chain(chain.clone()));
        Self {
            chain,
            wallet,
            swap: SwapOrchestrator::new(runner.clone()),
            transfer: TransferOrchestrator::new(runner.clone()),
            faucet: FaucetOrchestrator::new(runner.clone()),
            runner,
        }
    }

    /// Alice, signing through the injected wallet.
    pub fn external(&self) -> WalletSigner {
        WalletSigner::external(ALICE, self.wallet.clone(), Arc::new(self.chain.clone()))
    }
}

/// Drains the state transitions received so far.
pub fn states(events: &mut broadcast::Receiver<LifecycleEvent>) -> Vec<OrchestratorState> {
    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let LifecycleEvent::State { state, .. } = event {
            states.push(state);
        }
    }
    states
}
