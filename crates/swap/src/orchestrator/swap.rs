use super::runner::{Outcome, Run, Runner};
use crate::{
    error::SwapError,
    lifecycle::{LifecycleKind, OrchestratorState},
    quote::{QuoteBoard, QuoteResult},
    request::{Direction, SwapRequest},
};
use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolCall;
use metaswap_common::{
    DEFAULT_DECIMALS,
    contracts::{IMetaSwap, ITestToken},
    parse_amount,
};
use metaswap_wallets::WalletSigner;

/// Drives `Validating → (Approving) → Executing → Confirming → Succeeded | Failed`.
#[derive(Clone, Debug)]
pub struct SwapOrchestrator {
    runner: Runner,
}

impl SwapOrchestrator {
    pub fn new(runner: Runner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Executes `request` with `signer`.
    ///
    /// `quote`, when given, must have been computed for exactly this request on this chain.
    /// Token to native swaps approve the swap contract for exactly the swapped amount, and only
    /// if the current allowance is short of it.
    #[instrument(skip_all, fields(
        chain_id = self.runner.context().chain_id(),
        direction = %request.direction,
        amount = %request.amount,
        from = %signer.address(),
    ))]
    pub async fn submit(
        &self,
        signer: &WalletSigner,
        request: &SwapRequest,
        quote: Option<&QuoteResult>,
    ) -> Result<Outcome, SwapError> {
        let mut run = self.runner.start(signer)?;
        let result = self.execute(&mut run, request, quote).await;
        run.finish(result).await
    }

    /// Swaps what `board` describes, validated against its displayed quote.
    ///
    /// The board is emptied once the swap succeeded and left as is otherwise, so a failed swap
    /// can be retried unchanged.
    pub async fn submit_board(
        &self,
        signer: &WalletSigner,
        board: &mut QuoteBoard,
    ) -> Result<Outcome, SwapError> {
        let request = board.request();
        let quote = board.displayed().copied();
        let outcome = self.submit(signer, &request, quote.as_ref()).await?;
        board.clear();
        Ok(outcome)
    }

    async fn execute(
        &self,
        run: &mut Run<'_>,
        request: &SwapRequest,
        quote: Option<&QuoteResult>,
    ) -> Result<(), SwapError> {
        let amount = parse_amount(&request.amount, DEFAULT_DECIMALS)?;
        let binding = run.ctx().binding()?;
        run.ensure_balance(request.direction.input(), amount).await?;
        if let Some(quote) = quote
            && !quote.matches(request, run.ctx().chain_id())
        {
            return Err(SwapError::StaleQuote);
        }

        let (data, value) = match request.direction {
            Direction::NativeToToken => {
                let data = IMetaSwap::swapETHToTokenCall {}.abi_encode();
                (data, amount)
            }
            Direction::TokenToNative => {
                let allowance = self.runner.reader().allowance(run.owner()).await?;
                if allowance < amount {
                    debug!(%allowance, %amount, "approving swap contract");
                    run.enter(OrchestratorState::Approving);
                    let approve =
                        ITestToken::approveCall { spender: binding.swap, amount }.abi_encode();
                    run.step(LifecycleKind::Approve, binding.token, approve.into(), U256::ZERO)
                        .await?;
                } else {
                    trace!(%allowance, "allowance suffices");
                }
                let data = IMetaSwap::swapTokenToETHCall { tokenAmount: amount }.abi_encode();
                (data, U256::ZERO)
            }
        };

        run.enter(OrchestratorState::Executing);
        let hash = run.step(LifecycleKind::Swap, binding.swap, Bytes::from(data), value).await?;
        info!(run = %run.id(), tx_hash = %hash, "swap confirmed");
        Ok(())
    }
}
