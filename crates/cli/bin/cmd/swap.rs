use clap::Parser;
use eyre::Result;
use metaswap::{Direction, QuoteBoard, QuoteEngine, SwapOrchestrator};
use metaswap_cli::{
    context::App,
    events::{EventPrinter, stream},
    opts::WalletOpts,
    utils,
};
use metaswap_common::{DEFAULT_DECIMALS, parse_amount};

/// CLI arguments for `metaswap swap`.
#[derive(Clone, Debug, Parser)]
pub struct SwapArgs {
    /// `native-to-token` (`buy`) or `token-to-native` (`sell`).
    pub direction: Direction,

    /// The input amount, in whole units.
    pub amount: String,
}

impl SwapArgs {
    pub async fn run(self, mut app: App, wallet: &WalletOpts) -> Result<()> {
        let connected = app.connect(wallet).await?;
        let ctx = connected.ctx.clone();
        let signer = match connected.signer(&app.session).await {
            Ok(signer) => signer,
            Err(err) => {
                connected.close().await?;
                return Err(err);
            }
        };

        let mut board = QuoteBoard::new(ctx.chain_id(), self.direction);
        board.set_amount(self.amount);
        let engine = QuoteEngine::new(ctx.clone());
        if let Some(quote) = board.refresh(&engine).await
            && !app.global.quiet
            && let Ok(amount) = parse_amount(board.amount(), DEFAULT_DECIMALS)
        {
            eprintln!(
                "Quote: {} -> {}",
                utils::format_asset(amount, board.direction().input(), ctx.profile()),
                utils::format_asset(quote.output, board.direction().output(), ctx.profile()),
            );
        }

        let orchestrator = SwapOrchestrator::new(app.runner(ctx.clone()));
        let printer = EventPrinter::new(ctx.profile().clone(), app.global.quiet);
        let result = stream(
            orchestrator.runner().bus(),
            &printer,
            orchestrator.submit_board(&signer, &mut board),
        )
        .await;
        connected.close().await?;

        super::print_outcome(&app, &ctx, &result?)
    }
}
