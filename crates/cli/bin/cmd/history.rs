use clap::Parser;
use eyre::{Result, eyre};
use metaswap::{LedgerClient, SwapHistory};
use metaswap_cli::{context::App, utils};
use serde_json::json;

/// CLI arguments for `metaswap history`.
#[derive(Clone, Debug, Parser)]
pub struct HistoryArgs {
    /// The 1-based page to show.
    #[arg(long, short, default_value_t = 1)]
    pub page: usize,
}

impl HistoryArgs {
    pub async fn run(self, app: App) -> Result<()> {
        let chain_id = app.selected_chain()?;
        let profile = app
            .networks
            .chains
            .resolve(chain_id)
            .ok_or_else(|| eyre!("unsupported chain {chain_id}"))?;

        let ledger = LedgerClient::new(app.config.ledger_url.clone())?;
        let history = SwapHistory::new(ledger.recent_swaps(app.config.ledger_limit).await?);
        let page = history.page(self.page);

        if app.global.json {
            return utils::print_json(&json!({
                "page": self.page,
                "totalPages": history.total_pages(),
                "swaps": page,
            }));
        }
        if page.is_empty() {
            println!("No swaps on page {} of {}", self.page, history.total_pages());
            return Ok(());
        }
        for swap in page {
            let time = swap.timestamp.with_timezone(&chrono::Local);
            println!(
                "{}  {}  {} -> {}",
                time.format("%Y-%m-%d %H:%M:%S"),
                swap.user,
                utils::format_asset(swap.amount_in, swap.direction.input(), profile),
                utils::format_asset(swap.amount_out, swap.direction.output(), profile),
            );
        }
        println!("Page {} of {}", self.page, history.total_pages());
        Ok(())
    }
}
