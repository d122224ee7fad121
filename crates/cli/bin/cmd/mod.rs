//! Subcommands of the `metaswap` binary.

use eyre::Result;
use metaswap::{ChainContext, Outcome};
use metaswap_cli::{context::App, utils};

pub mod account;
pub mod balance;
pub mod chains;
pub mod faucet;
pub mod history;
pub mod quote;
pub mod send;
pub mod swap;

/// Prints the result of a completed run.
pub fn print_outcome(app: &App, ctx: &ChainContext, outcome: &Outcome) -> Result<()> {
    if app.global.json {
        return utils::print_json(outcome);
    }
    if let Some(hash) = outcome.tx_hash() {
        println!("{}", ctx.profile().tx_url(hash));
    }
    Ok(())
}
