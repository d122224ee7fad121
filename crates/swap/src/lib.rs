//! # metaswap
//!
//! Swaps a chain's native asset for the MetaSwap test token and back, and transfers either asset,
//! through whichever signing backend the active account has.
//!
//! The orchestrators report progress as [`LifecycleEvent`]s on an [`EventBus`]; they never
//! render anything themselves.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod balance;
pub mod chain;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod orchestrator;
pub mod quote;
pub mod request;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use balance::{BalancePoller, BalancePollerHandle, BalanceReader, Balances};
pub use chain::{ChainContext, Networks};
pub use error::{ErrorKind, SwapError};
pub use ledger::{LedgerClient, SwapEvent, SwapHistory};
pub use lifecycle::{
    EventBus, LifecycleEvent, LifecycleKind, OrchestratorState, TxLifecycle, TxStatus,
};
pub use orchestrator::{
    FaucetOrchestrator, InFlight, Outcome, Runner, SwapOrchestrator, TransferOrchestrator,
};
pub use quote::{QuoteBoard, QuoteEngine, QuoteKey, QuoteResult};
pub use request::{Asset, Direction, SwapRequest, TransferRequest};
