use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of backend signs for an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Backend {
    /// A wallet injected into the page, e.g. a browser extension.
    ExternalWallet,
    /// A remotely held key, authorized with a passkey.
    RemoteSigner,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExternalWallet => f.write_str("external wallet"),
            Self::RemoteSigner => f.write_str("remote signer"),
        }
    }
}

/// Credential reference the remote signer needs to act for an account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub user_id: String,
    pub organization_id: String,
}

/// The connected account of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHandle {
    pub address: Address,
    pub backend: Backend,
    /// Set for remote signer accounts once the organization is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthContext>,
}

impl AccountHandle {
    pub fn external(address: Address) -> Self {
        Self { address, backend: Backend::ExternalWallet, auth: None }
    }

    pub fn remote(address: Address, auth: Option<AuthContext>) -> Self {
        Self { address, backend: Backend::RemoteSigner, auth }
    }
}
