//! Registry of deployed contract addresses, read from the `deployments/` directory.
//!
//! Each deployment file is a JSON object keyed by the decimal chain id, plus an `abi` entry
//! which is ignored here:
//!
//! ```json
//! {
//!   "10143": { "chainId": 10143, "chainName": "monadTestnet", "address": "0x…" },
//!   "abi": []
//! }
//! ```

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Path, PathBuf},
};

/// Deployment file of the fungible test token.
pub const TOKEN_DEPLOYMENT_FILE: &str = "testToken.json";
/// Deployment file of the swap contract.
pub const SWAP_DEPLOYMENT_FILE: &str = "metaSwap.json";
/// Deployment file of the event hub indexed by the ledger service.
pub const SWAP_HUB_DEPLOYMENT_FILE: &str = "swapHub.json";

/// Errors raised while reading deployment files.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read deployment file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("malformed deployment file {}: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("deployment file {} is keyed by chain {key} but the entry says chain {chain_id}", path.display())]
    ChainMismatch { path: PathBuf, key: u64, chain_id: u64 },
}

/// A single contract deployment on one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentEntry {
    pub address: Address,
    pub chain_id: u64,
    #[serde(default)]
    pub chain_name: Option<String>,
    #[serde(default)]
    pub deployed_at: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
}

/// The token and swap contracts deployed on one chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractBinding {
    pub chain_id: u64,
    pub token: Address,
    pub swap: Address,
    /// Swap event hub, when deployed.
    pub swap_hub: Option<Address>,
}

/// All known deployments, keyed by chain id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractRegistry {
    tokens: BTreeMap<u64, DeploymentEntry>,
    swaps: BTreeMap<u64, DeploymentEntry>,
    hubs: BTreeMap<u64, DeploymentEntry>,
}

impl ContractRegistry {
    /// Loads every deployment file found in `dir`.
    ///
    /// A missing directory or file yields no deployments for that contract.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        let registry = Self {
            tokens: read_deployments(&dir.join(TOKEN_DEPLOYMENT_FILE))?,
            swaps: read_deployments(&dir.join(SWAP_DEPLOYMENT_FILE))?,
            hubs: read_deployments(&dir.join(SWAP_HUB_DEPLOYMENT_FILE))?,
        };
        trace!(dir = %dir.display(), chains = ?registry.available_chains(), "loaded deployments");
        Ok(registry)
    }

    /// Registers a binding directly.
    pub fn insert(&mut self, binding: ContractBinding) {
        let entry = |address| DeploymentEntry {
            address,
            chain_id: binding.chain_id,
            chain_name: None,
            deployed_at: None,
            contract_name: None,
        };
        self.tokens.insert(binding.chain_id, entry(binding.token));
        self.swaps.insert(binding.chain_id, entry(binding.swap));
        match binding.swap_hub {
            Some(hub) => self.hubs.insert(binding.chain_id, entry(hub)),
            None => self.hubs.remove(&binding.chain_id),
        };
    }

    /// Returns the binding for `chain_id`, if both the token and the swap contract are deployed
    /// there.
    pub fn resolve(&self, chain_id: u64) -> Option<ContractBinding> {
        let token = self.tokens.get(&chain_id)?;
        let swap = self.swaps.get(&chain_id)?;
        Some(ContractBinding {
            chain_id,
            token: token.address,
            swap: swap.address,
            swap_hub: self.hubs.get(&chain_id).map(|hub| hub.address),
        })
    }

    /// Chains that have a complete binding.
    pub fn available_chains(&self) -> BTreeSet<u64> {
        self.tokens.keys().filter(|id| self.swaps.contains_key(id)).copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.available_chains().is_empty()
    }
}

fn read_deployments(path: &Path) -> Result<BTreeMap<u64, DeploymentEntry>, RegistryError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => return Err(RegistryError::Io { path: path.to_path_buf(), source }),
    };
    let json_err = |source| RegistryError::Json { path: path.to_path_buf(), source };
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(&content).map_err(json_err)?;

    let mut deployments = BTreeMap::new();
    for (key, value) in raw {
        // `abi` and any other non chain id key
        let Ok(key) = key.parse::<u64>() else { continue };
        let entry: DeploymentEntry = serde_json::from_value(value).map_err(json_err)?;
        if entry.chain_id != key {
            return Err(RegistryError::ChainMismatch {
                path: path.to_path_buf(),
                key,
                chain_id: entry.chain_id,
            });
        }
        deployments.insert(key, entry);
    }
    Ok(deployments)
}
