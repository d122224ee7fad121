use super::runner::{Outcome, Run, Runner};
use crate::{
    error::SwapError,
    lifecycle::{LifecycleKind, OrchestratorState},
    request::{Asset, TransferRequest},
};
use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolCall;
use metaswap_common::{DEFAULT_DECIMALS, contracts::ITestToken, parse_amount};
use metaswap_wallets::WalletSigner;

/// Sends either asset to another address.
#[derive(Clone, Debug)]
pub struct TransferOrchestrator {
    runner: Runner,
}

impl TransferOrchestrator {
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Transfers `request.amount` of `request.asset` from the signer's account to `request.to`.
    ///
    /// Native transfers work on any supported chain, token transfers need the token deployed.
    #[instrument(skip_all, fields(
        chain_id = self.runner.context().chain_id(),
        asset = %request.asset,
        to = %request.to,
        amount = %request.amount,
    ))]
    pub async fn submit(
        &self,
        signer: &WalletSigner,
        request: &TransferRequest,
    ) -> Result<Outcome, SwapError> {
        let mut run = self.runner.start(signer)?;
        let result = execute(&mut run, request).await;
        run.finish(result).await
    }
}

async fn execute(run: &mut Run<'_>, request: &TransferRequest) -> Result<(), SwapError> {
    if request.to.is_zero() {
        return Err(SwapError::InvalidRecipient);
    }
    let amount = parse_amount(&request.amount, DEFAULT_DECIMALS)?;
    let (to, data, value) = match request.asset {
        Asset::Native => (request.to, Bytes::new(), amount),
        Asset::Token => {
            let token = run.ctx().binding()?.token;
            let data = ITestToken::transferCall { to: request.to, amount }.abi_encode();
            (token, data.into(), U256::ZERO)
        }
    };
    run.ensure_balance(request.asset, amount).await?;

    run.enter(OrchestratorState::Executing);
    let hash = run.step(LifecycleKind::Transfer, to, data, value).await?;
    info!(run = %run.id(), tx_hash = %hash, "transfer confirmed");
    Ok(())
}
