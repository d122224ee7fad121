use crate::{injected::ProviderError, remote::RemoteSignerError, session::SessionError};
use alloy_primitives::Address;

#[derive(Debug, thiserror::Error)]
pub enum WalletSignerError {
    #[error("no signer available: connect a wallet or log in with a passkey")]
    SignerUnavailable,
    #[error("no passkey is registered for user {user_id}")]
    NoPasskeyRegistered { user_id: String },
    #[error("no organization is known for {address}, log in again")]
    MissingAuthContext { address: Address },
    #[error("request rejected in wallet: {0}")]
    ProviderRejected(String),
    #[error(transparent)]
    Provider(ProviderError),
    #[error(transparent)]
    Remote(#[from] RemoteSignerError),
    #[error("chain request failed: {0}")]
    Chain(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("metaswap was not built with support for the {0} signer")]
    UnsupportedSigner(&'static str),
}

impl WalletSignerError {
    pub fn browser_unsupported() -> Self {
        Self::UnsupportedSigner("browser wallet")
    }

    /// Wraps a chain access failure, keeping its full cause chain.
    pub fn chain(err: &eyre::Report) -> Self {
        Self::Chain(metaswap_common::errors::display_chain(err))
    }

    /// Whether the user declined the request, as opposed to a backend failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::ProviderRejected(_))
    }
}

impl From<ProviderError> for WalletSignerError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rejected(reason) => Self::ProviderRejected(reason),
            err => Self::Provider(err),
        }
    }
}
