use clap::Parser;
use eyre::{Result, eyre};
use metaswap_cli::{context::App, opts::WalletOpts, utils};
use serde_json::json;

/// CLI arguments for `metaswap chains`.
#[derive(Clone, Debug, Parser)]
pub struct ChainsArgs {}

impl ChainsArgs {
    pub fn run(self, app: App) -> Result<()> {
        let active = app.selected_chain()?;
        if app.global.json {
            let chains = app
                .networks
                .chains
                .iter()
                .map(|chain| {
                    json!({
                        "chainId": chain.chain_id,
                        "name": chain.name,
                        "alias": chain.alias,
                        "nativeSymbol": chain.native_symbol,
                        "deployed": app.networks.contracts.resolve(chain.chain_id).is_some(),
                        "active": chain.chain_id == active,
                    })
                })
                .collect::<Vec<_>>();
            return utils::print_json(&chains);
        }

        for chain in app.networks.chains.iter() {
            let marker = if chain.chain_id == active { "*" } else { " " };
            let deployed = if app.networks.contracts.resolve(chain.chain_id).is_some() {
                "deployed"
            } else {
                "no contracts"
            };
            println!(
                "{marker} {:<10} {:<16} {:<10} {deployed}",
                chain.chain_id, chain.name, chain.alias
            );
        }
        Ok(())
    }
}

/// CLI arguments for `metaswap switch-chain`.
#[derive(Clone, Debug, Parser)]
pub struct SwitchChainArgs {
    /// Chain id or alias.
    #[arg(value_name = "CHAIN")]
    pub chain: String,
}

impl SwitchChainArgs {
    pub async fn run(self, mut app: App, wallet: &WalletOpts) -> Result<()> {
        let profile = app
            .networks
            .chains
            .find(&self.chain)
            .cloned()
            .ok_or_else(|| eyre!("unsupported chain `{}`", self.chain))?;
        app.global.chain = Some(profile.chain_id.to_string());

        if wallet.is_injected() {
            let connected = app.connect(wallet).await?;
            connected.close().await?;
        }
        app.session.set_selected_chain(profile.chain_id)?;

        if app.global.json {
            return utils::print_json(&profile);
        }
        println!("Switched to {} ({})", profile.name, profile.chain_id);
        Ok(())
    }
}
