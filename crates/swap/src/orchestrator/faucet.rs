use super::runner::{Outcome, Run, Runner};
use crate::{
    error::SwapError,
    lifecycle::{LifecycleKind, OrchestratorState},
};
use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use metaswap_common::contracts::ITestToken;
use metaswap_wallets::WalletSigner;

/// Claims test tokens from the token contract's faucet.
#[derive(Clone, Debug)]
pub struct FaucetOrchestrator {
    runner: Runner,
}

impl FaucetOrchestrator {
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    #[instrument(skip_all, fields(
        chain_id = self.runner.context().chain_id(),
        from = %signer.address(),
    ))]
    pub async fn claim(&self, signer: &WalletSigner) -> Result<Outcome, SwapError> {
        let mut run = self.runner.start(signer)?;
        let result = execute(&mut run).await;
        run.finish(result).await
    }
}

async fn execute(run: &mut Run<'_>) -> Result<(), SwapError> {
    let token = run.ctx().binding()?.token;
    run.enter(OrchestratorState::Executing);
    let data = ITestToken::faucetCall {}.abi_encode();
    let hash = run.step(LifecycleKind::Faucet, token, data.into(), U256::ZERO).await?;
    info!(run = %run.id(), tx_hash = %hash, "faucet claim confirmed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        lifecycle::EventBus,
        test_utils::{
            ALICE, MockChain, MockInjected, deployed_context, faucet_amount, undeployed_context,
        },
    };
    use std::sync::Arc;

    fn signer(chain: &MockChain) -> WalletSigner {
        let wallet = Arc::new(MockInjected::new(vec![ALICE]).on_chain(chain.clone()));
        WalletSigner::external(ALICE, wallet, Arc::new(chain.clone()))
    }

    fn orchestrator(ctx: crate::chain::ChainContext) -> FaucetOrchestrator {
        FaucetOrchestrator::new(Runner::new(ctx, EventBus::default()))
    }

    #[tokio::test]
    async fn claims_tokens() {
        let chain = MockChain::default();
        let faucet = orchestrator(deployed_context(chain.clone()));

        let outcome = faucet.claim(&signer(&chain)).await.unwrap();
        assert_eq!(chain.token_of(ALICE), faucet_amount());
        assert_eq!(outcome.balances.token, Some(faucet_amount()));
        assert_eq!(outcome.transactions[0].kind, LifecycleKind::Faucet);
    }

    #[tokio::test]
    async fn failures() {
        let chain = MockChain::default();
        let faucet = orchestrator(undeployed_context(chain.clone()));
        let err = faucet.claim(&signer(&chain)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedNetwork);
        assert!(chain.sent().is_empty());

        chain.revert_on(ITestToken::faucetCall::SELECTOR);
        let faucet = orchestrator(deployed_context(chain.clone()));
        let err = faucet.claim(&signer(&chain)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FaucetFailed);
        assert_eq!(chain.token_of(ALICE), U256::ZERO);
    }
}
