//! # metaswap-config
//!
//! MetaSwap configuration, chain registry and contract deployments.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use eyre::{ContextCompat, WrapErr};
use figment::{
    Error, Figment, Metadata, Profile, Provider,
    providers::{Env, Serialized},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub mod chain;
pub use chain::{
    AddChainParams, ChainProfile, ChainRegistry, MONAD_TESTNET_CHAIN_ID, SEPOLIA_CHAIN_ID,
};

pub mod deployments;
pub use deployments::{ContractBinding, ContractRegistry, DeploymentEntry, RegistryError};

mod endpoints;
pub use endpoints::{RpcEndpointUrl, RpcEndpoints, UnresolvedEnvVarError};

pub mod error;
pub use error::ExtractConfigError;

mod providers;
use providers::TomlFileProvider;

/// Default GraphQL endpoint of the swap event indexer.
pub const DEFAULT_LEDGER_URL: &str = "https://indexer.dev.hyperindex.xyz/9cb1975/v1/graphql";

/// MetaSwap configuration.
///
/// Assembled from, in ascending priority: the defaults, `metaswap.toml` and `METASWAP_`
/// prefixed environment variables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The selected profile. **(default: _default_ `default`)**
    ///
    /// **Note:** This field is never serialized nor deserialized. When a `Config` is merged into
    /// a `Figment` as a `Provider`, this profile is selected on the `Figment`.
    #[serde(skip)]
    pub profile: Profile,
    /// Chain id used when nothing else selects a network.
    pub chain: u64,
    /// Directory holding the deployment JSON files.
    pub deployments: PathBuf,
    /// RPC url overrides, keyed by chain id or chain alias.
    pub rpc_endpoints: RpcEndpoints,
    /// How long to wait for a transaction receipt, in seconds.
    pub transaction_timeout: u64,
    /// Balance polling interval, in seconds.
    pub poll_interval: u64,
    /// Receipt polling interval, in milliseconds.
    pub receipt_poll_interval: u64,
    /// GraphQL endpoint of the swap event indexer.
    pub ledger_url: String,
    /// How many events to fetch per swap direction.
    pub ledger_limit: usize,
    pub remote_signer: RemoteSignerConfig,
    /// Port of the local browser wallet bridge.
    pub browser_port: u16,
    /// Overrides the session file, defaults to `~/.metaswap/session.json`.
    pub session_file: Option<PathBuf>,
}

/// Settings of the passkey backed remote signing service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSignerConfig {
    /// Base url of the signing API. The remote backend is unavailable without it.
    pub api_url: Option<String>,
    /// Organization used for users that have no stored mapping.
    pub organization_id: Option<String>,
}

impl Config {
    /// The default profile: "default"
    pub const DEFAULT_PROFILE: Profile = Profile::Default;

    /// File name of config toml file
    pub const FILE_NAME: &'static str = "metaswap.toml";

    /// The name of the directory metaswap reserves for itself under the user's home directory
    pub const METASWAP_DIR_NAME: &'static str = ".metaswap";

    /// Sections that map directly to nested structs when read from env vars.
    const NESTED_SECTIONS: &'static [&'static str] = &["remote_signer", "rpc_endpoints"];

    /// Loads the `Config` from the current directory.
    ///
    /// See [`Self::figment`].
    pub fn load() -> Result<Self, ExtractConfigError> {
        Self::try_from(Self::figment())
    }

    /// Returns the default figment, merging the config file and the environment.
    ///
    /// The config file is the one named by `METASWAP_CONFIG`, or the first `metaswap.toml` found
    /// in the current directory or any of its parents.
    pub fn figment() -> Figment {
        let toml = Self::find_config_file().unwrap_or_else(|| PathBuf::from(Self::FILE_NAME));
        Self::figment_with_file(toml)
    }

    /// Returns the figment using `toml` as the config file.
    pub fn figment_with_file(toml: impl Into<PathBuf>) -> Figment {
        let profile = Self::selected_profile();
        Figment::from(Self::default())
            .merge(TomlFileProvider::new(Some("METASWAP_CONFIG"), toml))
            .merge(
                Env::prefixed("METASWAP_")
                    .ignore(&["PROFILE", "CONFIG", "DEBUG"])
                    .map(|key| {
                        let key = key.as_str().to_ascii_lowercase();
                        for section in Self::NESTED_SECTIONS {
                            if let Some(rest) = key.strip_prefix(&format!("{section}_")) {
                                return format!("{section}.{rest}").into();
                            }
                        }
                        key.into()
                    })
                    .global(),
            )
            .select(profile)
    }

    /// Attempts to extract a `Config` from `provider`, returning the result.
    pub fn try_from<T: Provider>(provider: T) -> Result<Self, ExtractConfigError> {
        let figment = Figment::from(provider);
        let mut config = figment.extract::<Self>().map_err(ExtractConfigError::new)?;
        config.profile = figment.profile().clone();
        Ok(config)
    }

    /// Returns the selected profile.
    ///
    /// If the `METASWAP_PROFILE` env variable is not set, this returns the `DEFAULT_PROFILE`.
    pub fn selected_profile() -> Profile {
        Profile::from_env_or("METASWAP_PROFILE", Self::DEFAULT_PROFILE)
    }

    /// Returns the path to the `metaswap.toml` file, the file is searched for in
    /// the current working directory and all parent directories until the root,
    /// and the first hit is used.
    ///
    /// An absolute `METASWAP_CONFIG` is used as is.
    pub fn find_config_file() -> Option<PathBuf> {
        fn find(path: &Path) -> Option<PathBuf> {
            if path.is_absolute() {
                return path.is_file().then(|| path.to_path_buf());
            }
            let cwd = std::env::current_dir().ok()?;
            let mut cwd = cwd.as_path();
            loop {
                let file_path = cwd.join(path);
                if file_path.is_file() {
                    return Some(file_path);
                }
                cwd = cwd.parent()?;
            }
        }
        find(Env::var_or("METASWAP_CONFIG", Self::FILE_NAME).as_ref())
    }

    /// Returns the path to metaswap's home dir: `~/.metaswap/`.
    pub fn metaswap_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(Self::METASWAP_DIR_NAME))
    }

    /// Returns the session file: [`Self::session_file`] or `~/.metaswap/session.json`.
    pub fn session_path(&self) -> eyre::Result<PathBuf> {
        if let Some(path) = &self.session_file {
            return Ok(path.clone());
        }
        Self::metaswap_dir()
            .map(|dir| dir.join("session.json"))
            .wrap_err("Failed to find home directory")
    }

    /// Builds the chain registry with the configured endpoint overrides applied.
    pub fn chain_registry(&self) -> Result<ChainRegistry, UnresolvedEnvVarError> {
        ChainRegistry::default().with_endpoints(&self.rpc_endpoints)
    }

    /// Loads the contract registry from [`Self::deployments`].
    pub fn contract_registry(&self) -> eyre::Result<ContractRegistry> {
        ContractRegistry::load(&self.deployments)
            .wrap_err_with(|| {
                format!("failed to load deployments from {}", self.deployments.display())
            })
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval)
    }
}

impl Provider for Config {
    fn metadata(&self) -> Metadata {
        Metadata::named("MetaSwap Config")
    }

    #[track_caller]
    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        Serialized::defaults(self).data()
    }

    fn profile(&self) -> Option<Profile> {
        Some(self.profile.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: Self::DEFAULT_PROFILE,
            chain: SEPOLIA_CHAIN_ID,
            deployments: PathBuf::from("deployments"),
            rpc_endpoints: RpcEndpoints::default(),
            transaction_timeout: 120,
            poll_interval: 10,
            receipt_poll_interval: 1000,
            ledger_url: DEFAULT_LEDGER_URL.to_string(),
            ledger_limit: 20,
            remote_signer: RemoteSignerConfig::default(),
            browser_port: 9545,
            session_file: None,
        }
    }
}
