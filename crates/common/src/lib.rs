//! Common utilities for building and using MetaSwap's tools.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod contracts;
pub mod errors;
pub mod provider;
pub mod units;

pub use client::{ChainClient, ReceiptOutcome, RpcChainClient};
pub use provider::ProviderBuilder;
pub use units::{AmountError, DEFAULT_DECIMALS, format_amount, parse_amount};

use std::time::Duration;

/// The timeout of a single RPC request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);
