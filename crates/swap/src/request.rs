//! User requests as submitted to the orchestrators.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Which way a swap converts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    NativeToToken,
    TokenToNative,
}

impl Direction {
    /// The asset given up.
    pub const fn input(self) -> Asset {
        match self {
            Self::NativeToToken => Asset::Native,
            Self::TokenToNative => Asset::Token,
        }
    }

    /// The asset received.
    pub const fn output(self) -> Asset {
        match self {
            Self::NativeToToken => Asset::Token,
            Self::TokenToNative => Asset::Native,
        }
    }

    pub const fn reversed(self) -> Self {
        match self {
            Self::NativeToToken => Self::TokenToNative,
            Self::TokenToNative => Self::NativeToToken,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NativeToToken => f.write_str("native-to-token"),
            Self::TokenToNative => f.write_str("token-to-native"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native-to-token" | "buy" | "eth-to-token" => Ok(Self::NativeToToken),
            "token-to-native" | "sell" | "token-to-eth" => Ok(Self::TokenToNative),
            other => Err(format!(
                "unknown direction `{other}`, expected `native-to-token` or `token-to-native`"
            )),
        }
    }
}

/// The two assets of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Asset {
    Native,
    Token,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Token => f.write_str("token"),
        }
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" | "eth" | "mon" => Ok(Self::Native),
            "token" | "musd" => Ok(Self::Token),
            other => Err(format!("unknown asset `{other}`, expected `native` or `token`")),
        }
    }
}

/// A swap as entered by the user. The amount is parsed during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapRequest {
    pub direction: Direction,
    pub amount: String,
}

impl SwapRequest {
    pub fn new(direction: Direction, amount: impl Into<String>) -> Self {
        Self { direction, amount: amount.into() }
    }
}

/// A plain transfer of either asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub asset: Asset,
    pub to: Address,
    pub amount: String,
}

impl TransferRequest {
    pub fn new(asset: Asset, to: Address, amount: impl Into<String>) -> Self {
        Self { asset, to, amount: amount.into() }
    }
}
