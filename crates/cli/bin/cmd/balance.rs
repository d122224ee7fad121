use alloy_primitives::Address;
use clap::Parser;
use eyre::{Result, eyre};
use metaswap::{Asset, BalancePoller, BalanceReader, Balances, ChainContext};
use metaswap_cli::{context::App, opts::WalletOpts, utils};
use serde_json::json;

/// CLI arguments for `metaswap balance`.
#[derive(Clone, Debug, Parser)]
pub struct BalanceArgs {
    /// The account to inspect. Defaults to the connected one.
    #[arg(value_name = "ADDRESS")]
    pub address: Option<Address>,

    /// Keep re-reading every `poll_interval` until interrupted.
    #[arg(long, short)]
    pub watch: bool,
}

impl BalanceArgs {
    pub async fn run(self, mut app: App, wallet: &WalletOpts) -> Result<()> {
        let (ctx, owner, connected) = if wallet.is_injected() {
            let connected = app.connect(wallet).await?;
            let injected = match connected.selector.injected() {
                Some(provider) => provider.accounts().await?.first().copied(),
                None => None,
            };
            (connected.ctx.clone(), self.address.or(injected), Some(connected))
        } else {
            (app.read_only().await?, self.address, None)
        };
        let owner = owner
            .or_else(|| app.session.account().map(|account| account.address))
            .ok_or_else(|| eyre!("no account connected, pass an address"))?;

        if let Some(connected) = connected {
            connected.close().await?;
        }

        let reader = BalanceReader::new(ctx.clone());
        if !self.watch {
            let mut balances = Balances::default();
            reader.refresh(owner, &mut balances).await;
            return print_balances(&app, &ctx, owner, &balances);
        }

        let poller = BalancePoller::new(reader, owner, app.config.poll_interval()).spawn();
        let mut updates = poller.subscribe();
        // the initial value is the empty snapshot, wait for the first round
        updates.mark_unchanged();
        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                    let balances = *updates.borrow_and_update();
                    print_balances(&app, &ctx, owner, &balances)?;
                }
                _ = tokio::signal::ctrl_c() => return Ok(()),
            }
        }
    }
}

fn print_balances(
    app: &App,
    ctx: &ChainContext,
    owner: Address,
    balances: &Balances,
) -> Result<()> {
    let profile = ctx.profile();
    if app.global.json {
        return utils::print_json(&json!({
            "chainId": ctx.chain_id(),
            "owner": owner,
            "balances": balances,
        }));
    }
    println!("{} on {}", owner, profile.name);
    println!("  {}", utils::format_balance(balances.native, Asset::Native, profile));
    if ctx.is_deployed() {
        println!("  {}", utils::format_balance(balances.token, Asset::Token, profile));
        let allowance = utils::format_balance(balances.allowance, Asset::Token, profile);
        println!("  allowance {allowance}");
    }
    println!("  {}", profile.address_url(owner));
    Ok(())
}
