//! The injected wallet surface (EIP-1193).

use alloy_json_rpc::RpcRecv;
use alloy_primitives::{Address, TxHash};
use alloy_provider::{DynProvider, Provider};
use alloy_rpc_types::TransactionRequest;
use metaswap_common::provider::error_payload;
use metaswap_config::AddChainParams;
use serde_json::json;
use std::borrow::Cow;

/// EIP-1193 `4001`: the user rejected the request.
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// EIP-1193 `4100`: the requested account or method is not authorized.
pub const UNAUTHORIZED: i64 = 4100;
/// EIP-3326 `4902`: the chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// JSON-RPC `-32601`: method not found.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Errors reported by an injected provider.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("request rejected in wallet: {0}")]
    Rejected(String),
    #[error("chain has not been added to the wallet: {0}")]
    ChainNotAdded(String),
    #[error("wallet is not connected")]
    Disconnected,
    #[error("timed out waiting for the wallet to answer {0}")]
    Timeout(String),
    #[error("wallet error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Maps an EIP-1193 error object.
    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            USER_REJECTED_REQUEST | UNAUTHORIZED => Self::Rejected(message),
            UNRECOGNIZED_CHAIN => Self::ChainNotAdded(message),
            code => Self::Rpc { code, message },
        }
    }
}

/// A wallet that owns its keys and signs and broadcasts on request.
#[async_trait::async_trait]
pub trait InjectedProvider: Send + Sync {
    /// Connected accounts, most recently used first. Empty when the wallet is locked or not
    /// connected.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;

    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// `eth_sendTransaction`: signs and broadcasts `tx`.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError>;

    /// `wallet_switchEthereumChain`
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;

    /// `wallet_addEthereumChain`
    async fn add_chain(&self, params: &AddChainParams) -> Result<(), ProviderError>;
}

/// Forwards EIP-1193 requests to a JSON-RPC endpoint that manages unlocked accounts, such as a
/// development node or a wallet daemon.
#[derive(Clone)]
pub struct RpcInjectedProvider {
    provider: DynProvider,
    /// Restricts the exposed accounts to this one.
    from: Option<Address>,
}

impl std::fmt::Debug for RpcInjectedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcInjectedProvider").field("from", &self.from).finish_non_exhaustive()
    }
}

impl RpcInjectedProvider {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider, from: None }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    async fn request<R: RpcRecv>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<R, ProviderError> {
        self.provider.raw_request::<_, R>(Cow::Borrowed(method), params).await.map_err(|err| {
            match error_payload(&err) {
                Some(payload) => {
                    ProviderError::from_code(payload.code, payload.message.to_string())
                }
                None => ProviderError::Other(format!("{method} failed: {err}")),
            }
        })
    }
}

#[async_trait::async_trait]
impl InjectedProvider for RpcInjectedProvider {
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let accounts: Vec<Address> = self.request("eth_accounts", json!([])).await?;
        Ok(match self.from {
            Some(from) => accounts.into_iter().filter(|account| *account == from).collect(),
            None => accounts,
        })
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|err| ProviderError::Other(format!("eth_chainId failed: {err}")))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError> {
        self.request("eth_sendTransaction", json!([tx])).await
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        let params = json!([{ "chainId": format!("{chain_id:#x}") }]);
        match self.request::<serde_json::Value>("wallet_switchEthereumChain", params).await {
            Ok(_) => Ok(()),
            // plain nodes serve exactly one chain
            Err(ProviderError::Rpc { code: METHOD_NOT_FOUND, .. }) => {
                let current = self.chain_id().await?;
                if current == chain_id {
                    Ok(())
                } else {
                    Err(ProviderError::Other(format!(
                        "endpoint serves chain {current} and can not switch to {chain_id}"
                    )))
                }
            }
            Err(err) => Err(err),
        }
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), ProviderError> {
        self.request::<serde_json::Value>("wallet_addEthereumChain", json!([params])).await?;
        Ok(())
    }
}
