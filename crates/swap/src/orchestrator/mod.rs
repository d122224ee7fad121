//! State machines that drive swaps, transfers and faucet claims through a [`WalletSigner`].
//!
//! [`WalletSigner`]: metaswap_wallets::WalletSigner

mod faucet;
mod runner;
mod swap;
mod transfer;

pub use faucet::FaucetOrchestrator;
pub use runner::{DEFAULT_TX_TIMEOUT, InFlight, InFlightGuard, Outcome, Runner};
pub use swap::SwapOrchestrator;
pub use transfer::TransferOrchestrator;
