use clap::Parser;
use eyre::Result;
use metaswap::FaucetOrchestrator;
use metaswap_cli::{
    context::App,
    events::{EventPrinter, stream},
    opts::WalletOpts,
};

/// CLI arguments for `metaswap faucet`.
#[derive(Clone, Debug, Parser)]
pub struct FaucetArgs {}

impl FaucetArgs {
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

        let orchestrator = FaucetOrchestrator::new(app.runner(ctx.clone()));
        let printer = EventPrinter::new(ctx.profile().clone(), app.global.quiet);
        let result =
            stream(orchestrator.runner().bus(), &printer, orchestrator.claim(&signer)).await;
        connected.close().await?;

        super::print_outcome(&app, &ctx, &result?)
    }
}
