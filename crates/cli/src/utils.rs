use alloy_primitives::U256;
use eyre::Result;
use metaswap::Asset;
use metaswap_common::{DEFAULT_DECIMALS, contracts::TOKEN_SYMBOL, units::format_amount_truncated};
use metaswap_config::ChainProfile;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Fractional digits shown for human readable amounts.
pub const DISPLAY_PLACES: usize = 6;

/// Installs the global `tracing` subscriber, configured through `RUST_LOG`.
pub fn subscriber() {
    tracing_subscriber::FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

/// Disables colors unless stdout and stderr are terminals and the environment allows them.
pub fn enable_paint() {
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);
}

/// Prints `value` as pretty JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The symbol `asset` is shown with on `chain`.
pub fn symbol(asset: Asset, chain: &ChainProfile) -> &str {
    match asset {
        Asset::Native => &chain.native_symbol,
        Asset::Token => TOKEN_SYMBOL,
    }
}

/// `1.5 MON`
pub fn format_asset(value: U256, asset: Asset, chain: &ChainProfile) -> String {
    format!(
        "{} {}",
        format_amount_truncated(value, DEFAULT_DECIMALS, DISPLAY_PLACES),
        symbol(asset, chain)
    )
}

/// Like [`format_asset`], `-` if the value could not be read.
pub fn format_balance(value: Option<U256>, asset: Asset, chain: &ChainProfile) -> String {
    match value {
        Some(value) => format_asset(value, asset, chain),
        None => format!("- {}", symbol(asset, chain)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaswap_config::{ChainRegistry, MONAD_TESTNET_CHAIN_ID};

    #[test]
    fn formats_with_symbol() {
        let registry = ChainRegistry::default();
        let monad = registry.resolve(MONAD_TESTNET_CHAIN_ID).unwrap();
        let value = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(format_asset(value, Asset::Native, monad), "1.5 MON");
        assert_eq!(format_asset(value, Asset::Token, monad), "1.5 mUSD");
        assert_eq!(format_balance(None, Asset::Token, monad), "- mUSD");
    }
}
