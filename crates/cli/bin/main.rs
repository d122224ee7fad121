#[macro_use]
extern crate tracing;

use clap::Parser;
use eyre::Result;
use metaswap_cli::{context::App, handler, utils};

mod args;
mod cmd;

use args::{Metaswap, MetaswapSubcommand};

fn main() -> Result<()> {
    handler::install();
    utils::subscriber();
    utils::enable_paint();
    let args = Metaswap::parse();
    main_args(args)
}

#[tokio::main]
async fn main_args(args: Metaswap) -> Result<()> {
    let Metaswap { global, wallet, cmd } = args;
    let app = App::load(global)?;
    trace!(chain = app.config.chain, "loaded config");
    match cmd {
        MetaswapSubcommand::Chains(cmd) => cmd.run(app),
        MetaswapSubcommand::SwitchChain(cmd) => cmd.run(app, &wallet).await,
        MetaswapSubcommand::Login(cmd) => cmd.run(app),
        MetaswapSubcommand::Logout(cmd) => cmd.run(app),
        MetaswapSubcommand::Balance(cmd) => cmd.run(app, &wallet).await,
        MetaswapSubcommand::Quote(cmd) => cmd.run(app).await,
        MetaswapSubcommand::Swap(cmd) => cmd.run(app, &wallet).await,
        MetaswapSubcommand::Send(cmd) => cmd.run(app, &wallet).await,
        MetaswapSubcommand::Faucet(cmd) => cmd.run(app, &wallet).await,
        MetaswapSubcommand::History(cmd) => cmd.run(app).await,
    }
}
