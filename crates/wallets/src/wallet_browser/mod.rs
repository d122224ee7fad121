//! Relays EIP-1193 requests to a wallet extension through a local bridge page.

pub mod error;
pub mod server;
pub mod types;

mod api;
mod state;

use alloy_primitives::{Address, TxHash};
use alloy_rpc_types::TransactionRequest;
use metaswap_config::AddChainParams;
use serde_json::json;

use crate::{
    injected::{InjectedProvider, ProviderError},
    wallet_browser::{error::BrowserWalletError, server::BrowserWalletServer, types::BrowserRequest},
};

pub use api::SESSION_TOKEN_HEADER;

/// An [`InjectedProvider`] backed by the wallet connected to a [`BrowserWalletServer`].
#[derive(Debug, Clone)]
pub struct BrowserWallet {
    server: BrowserWalletServer,
}

impl BrowserWallet {
    pub fn new(server: BrowserWalletServer) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &BrowserWalletServer {
        &self.server
    }

    async fn request(
        &self,
        operation: &'static str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        Ok(self.server.request(operation, BrowserRequest::new(method, params)).await?)
    }
}

#[async_trait::async_trait]
impl InjectedProvider for BrowserWallet {
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.server.get_connection().map(|connection| connection.address).into_iter().collect())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.server
            .get_connection()
            .map(|connection| connection.chain_id)
            .ok_or(ProviderError::Disconnected)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError> {
        let result = self.request("Transaction", "eth_sendTransaction", json!([tx])).await?;
        serde_json::from_value(result).map_err(|err| {
            BrowserWalletError::InvalidResponse(format!("expected a transaction hash: {err}"))
                .into()
        })
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        let params = json!([{ "chainId": format!("{chain_id:#x}") }]);
        self.request("Chain switch", "wallet_switchEthereumChain", params).await?;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), ProviderError> {
        self.request("Add chain", "wallet_addEthereumChain", json!([params])).await?;
        Ok(())
    }
}
