//! Supported networks and their metadata.

use crate::endpoints::{RpcEndpoints, UnresolvedEnvVarError};
use alloy_primitives::TxHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ethereum Sepolia testnet.
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
/// Monad testnet.
pub const MONAD_TESTNET_CHAIN_ID: u64 = 10143;

/// Static metadata for one supported network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainProfile {
    pub chain_id: u64,
    /// Human readable network name, e.g. `Monad Testnet`.
    pub name: String,
    /// Short lowercase key accepted in `rpc_endpoints`, e.g. `monad`.
    pub alias: String,
    pub native_symbol: String,
    pub rpc_url: String,
    pub explorer_url: String,
}

impl ChainProfile {
    /// Returns the block explorer page of the given transaction.
    pub fn tx_url(&self, hash: TxHash) -> String {
        format!("{}/tx/{hash:#x}", self.explorer_url.trim_end_matches('/'))
    }

    /// Returns the block explorer page of the given address.
    pub fn address_url(&self, address: alloy_primitives::Address) -> String {
        format!("{}/address/{address}", self.explorer_url.trim_end_matches('/'))
    }

    /// Returns the hex encoded chain id as used by `wallet_switchEthereumChain`.
    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Parameters for `wallet_addEthereumChain` (EIP-3085).
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.hex_chain_id(),
            chain_name: self.name.clone(),
            native_currency: NativeCurrency {
                name: self.native_symbol.clone(),
                symbol: self.native_symbol.clone(),
                decimals: 18,
            },
            rpc_urls: vec![self.rpc_url.clone()],
            block_explorer_urls: vec![self.explorer_url.clone()],
        }
    }

    fn sepolia() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            name: "Sepolia".to_string(),
            alias: "sepolia".to_string(),
            native_symbol: "ETH".to_string(),
            rpc_url: "https://ethereum-sepolia.publicnode.com".to_string(),
            explorer_url: "https://sepolia.etherscan.io".to_string(),
        }
    }

    fn monad_testnet() -> Self {
        Self {
            chain_id: MONAD_TESTNET_CHAIN_ID,
            name: "Monad Testnet".to_string(),
            alias: "monad".to_string(),
            native_symbol: "MON".to_string(),
            rpc_url: "https://testnet-rpc.monad.xyz".to_string(),
            explorer_url: "https://testnet.monadexplorer.com".to_string(),
        }
    }
}

/// EIP-3085 `wallet_addEthereumChain` parameter object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Lookup table of every network the application can operate on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainRegistry {
    chains: BTreeMap<u64, ChainProfile>,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new([ChainProfile::sepolia(), ChainProfile::monad_testnet()])
    }
}

impl ChainRegistry {
    /// Creates a registry from the given profiles. A later profile with the same chain id
    /// replaces an earlier one.
    pub fn new(profiles: impl IntoIterator<Item = ChainProfile>) -> Self {
        Self { chains: profiles.into_iter().map(|p| (p.chain_id, p)).collect() }
    }

    /// Applies `rpc_endpoints` overrides, matched by chain id first and then by alias.
    pub fn with_endpoints(
        mut self,
        endpoints: &RpcEndpoints,
    ) -> Result<Self, UnresolvedEnvVarError> {
        for profile in self.chains.values_mut() {
            let id = profile.chain_id.to_string();
            if let Some(endpoint) = endpoints.find([id.as_str(), profile.alias.as_str()]) {
                profile.rpc_url = endpoint.resolve()?;
            }
        }
        Ok(self)
    }

    pub fn resolve(&self, chain_id: u64) -> Option<&ChainProfile> {
        self.chains.get(&chain_id)
    }

    /// Looks up a chain by id (`10143`, `0x279f`) or alias (`monad`).
    pub fn find(&self, s: &str) -> Option<&ChainProfile> {
        let s = s.trim();
        let id = match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        };
        match id {
            Some(id) => self.resolve(id),
            None => self.chains.values().find(|p| p.alias.eq_ignore_ascii_case(s)),
        }
    }

    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.chains.contains_key(&chain_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainProfile> {
        self.chains.values()
    }
}
