use clap::Parser;
use eyre::{Result, WrapErr};
use metaswap::{Direction, QuoteBoard, QuoteEngine};
use metaswap_cli::{context::App, utils};
use metaswap_common::{DEFAULT_DECIMALS, parse_amount};

/// CLI arguments for `metaswap quote`.
#[derive(Clone, Debug, Parser)]
pub struct QuoteArgs {
    /// `native-to-token` (`buy`) or `token-to-native` (`sell`).
    pub direction: Direction,

    /// The input amount, in whole units.
    pub amount: String,
}

impl QuoteArgs {
    pub async fn run(self, mut app: App) -> Result<()> {
        let amount = parse_amount(&self.amount, DEFAULT_DECIMALS)
            .wrap_err_with(|| format!("invalid amount `{}`", self.amount))?;
        let ctx = app.read_only().await?;

        let mut board = QuoteBoard::new(ctx.chain_id(), self.direction);
        board.set_amount(self.amount.clone());
        let quote = board.refresh(&QuoteEngine::new(ctx.clone())).await;

        if app.global.json {
            return utils::print_json(&quote);
        }
        let profile = ctx.profile();
        match quote {
            Some(quote) => println!(
                "{} -> {}",
                utils::format_asset(amount, self.direction.input(), profile),
                utils::format_asset(quote.output, self.direction.output(), profile),
            ),
            None => println!("no quote available"),
        }
        Ok(())
    }
}
