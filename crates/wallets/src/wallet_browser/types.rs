use alloy_primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The account and chain reported by the browser wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub address: Address,
    pub chain_id: ChainId,
}

impl Connection {
    pub fn new(address: Address, chain_id: ChainId) -> Self {
        Self { address, chain_id }
    }
}

/// An EIP-1193 request waiting to be relayed to `window.ethereum`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserRequest {
    pub id: Uuid,
    pub method: String,
    pub params: serde_json::Value,
}

impl BrowserRequest {
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self { id: Uuid::new_v4(), method: method.into(), params }
    }
}

/// The error object of a failed EIP-1193 request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserRpcError {
    pub code: i64,
    pub message: String,
}

/// The wallet's answer to a [`BrowserRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserResponse {
    pub id: Uuid,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<BrowserRpcError>,
}

/// Envelope of every `/api` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum BrowserApiResponse<T = ()> {
    Ok(T),
    Error { message: String },
}

impl<T> BrowserApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}
