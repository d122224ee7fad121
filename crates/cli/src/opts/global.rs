use clap::Parser;

/// Options shared by every subcommand.
#[derive(Clone, Debug, Default, Parser)]
pub struct GlobalOpts {
    /// Print machine readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// The chain to use, by id or alias. Defaults to the wallet's chain, then the selected one.
    #[arg(long, short, global = true, value_name = "CHAIN", env = "METASWAP_CHAIN")]
    pub chain: Option<String>,

    /// Do not stream lifecycle events to stderr.
    #[arg(long, short, global = true)]
    pub quiet: bool,
}
