use alloy_primitives::Address;
use clap::Parser;
use eyre::Result;
use metaswap::{Asset, TransferOrchestrator, TransferRequest};
use metaswap_cli::{
    context::App,
    events::{EventPrinter, stream},
    opts::WalletOpts,
};

/// CLI arguments for `metaswap send`.
#[derive(Clone, Debug, Parser)]
pub struct SendArgs {
    /// `native` or `token`.
    pub asset: Asset,

    /// The recipient.
    #[arg(value_name = "TO")]
    pub to: Address,

    /// The amount, in whole units.
    pub amount: String,
}

impl SendArgs {
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

        let request = TransferRequest::new(self.asset, self.to, self.amount);
        let orchestrator = TransferOrchestrator::new(app.runner(ctx.clone()));
        let printer = EventPrinter::new(ctx.profile().clone(), app.global.quiet);
        let result = stream(
            orchestrator.runner().bus(),
            &printer,
            orchestrator.submit(&signer, &request),
        )
        .await;
        connected.close().await?;

        super::print_outcome(&app, &ctx, &result?)
    }
}
