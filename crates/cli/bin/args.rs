use crate::cmd::{
    account::{LoginArgs, LogoutArgs},
    balance::BalanceArgs,
    chains::{ChainsArgs, SwitchChainArgs},
    faucet::FaucetArgs,
    history::HistoryArgs,
    quote::QuoteArgs,
    send::SendArgs,
    swap::SwapArgs,
};
use clap::{Parser, Subcommand};
use metaswap_cli::opts::{GlobalOpts, WalletOpts};

/// Swap and send test assets on EVM testnets.
#[derive(Debug, Parser)]
#[command(name = "metaswap", version, propagate_version = true, next_display_order = None)]
pub struct Metaswap {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(flatten)]
    pub wallet: WalletOpts,

    #[command(subcommand)]
    pub cmd: MetaswapSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum MetaswapSubcommand {
    /// List the supported chains.
    #[command(visible_alias = "c")]
    Chains(ChainsArgs),

    /// Select the active chain, asking the connected wallet to follow.
    SwitchChain(SwitchChainArgs),

    /// Log in to the remote signer.
    Login(LoginArgs),

    /// Log out and forget the account's organization.
    Logout(LogoutArgs),

    /// Show native, token and allowance balances.
    #[command(visible_alias = "b")]
    Balance(BalanceArgs),

    /// Quote a swap without submitting it.
    #[command(visible_alias = "q")]
    Quote(QuoteArgs),

    /// Swap the native asset for the token or back.
    #[command(visible_alias = "s")]
    Swap(SwapArgs),

    /// Send the native asset or the token.
    Send(SendArgs),

    /// Claim test tokens from the faucet.
    Faucet(FaucetArgs),

    /// Show recent swaps of all users.
    #[command(visible_alias = "h")]
    History(HistoryArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use metaswap::{Asset, Direction};

    #[test]
    fn verify_cli() {
        Metaswap::command().debug_assert();
    }

    #[test]
    fn parses_swap() {
        let args = Metaswap::parse_from(["metaswap", "swap", "sell", "1.5", "--json"]);
        assert!(args.global.json);
        match args.cmd {
            MetaswapSubcommand::Swap(swap) => {
                assert_eq!(swap.direction, Direction::TokenToNative);
                assert_eq!(swap.amount, "1.5");
            }
            cmd => panic!("unexpected command {cmd:?}"),
        }
    }

    #[test]
    fn parses_balance_watch() {
        let args = Metaswap::parse_from(["metaswap", "balance", "-w", "--json"]);
        assert!(args.global.json);
        match args.cmd {
            MetaswapSubcommand::Balance(balance) => {
                assert!(balance.watch);
                assert_eq!(balance.address, None);
            }
            cmd => panic!("unexpected command {cmd:?}"),
        }
    }

    #[test]
    fn parses_send() {
        let args = Metaswap::parse_from([
            "metaswap",
            "send",
            "token",
            "0x00000000000000000000000000000000000000b0",
            "3",
            "--chain",
            "sepolia",
        ]);
        assert_eq!(args.global.chain.as_deref(), Some("sepolia"));
        match args.cmd {
            MetaswapSubcommand::Send(send) => assert_eq!(send.asset, Asset::Token),
            cmd => panic!("unexpected command {cmd:?}"),
        }
    }

    #[test]
    fn wallet_flags_conflict() {
        let res = Metaswap::try_parse_from(["metaswap", "--browser", "--unlocked", "faucet"]);
        assert!(res.is_err());
        let res = Metaswap::try_parse_from(["metaswap", "--unlocked", "faucet"]);
        assert!(res.is_err(), "--unlocked requires --from");
    }
}
