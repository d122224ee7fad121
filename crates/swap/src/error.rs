use crate::request::Asset;
use alloy_primitives::{Address, TxHash, U256};
use metaswap_common::AmountError;
use metaswap_wallets::{WalletSignerError, session::SessionError};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// The failure categories reported to the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidAmount,
    InsufficientBalance,
    /// No contracts are deployed on the chain, or the chain is not supported at all.
    UnsupportedNetwork,
    SignerUnavailable,
    NoPasskeyRegistered,
    MissingAuthContext,
    ProviderRejected,
    ApprovalFailed,
    SwapExecutionFailed,
    TransferFailed,
    FaucetFailed,
    /// No receipt appeared within the transaction timeout.
    Timeout,
    ReadFailure,
    StaleQuote,
    RequestInFlight,
    InvalidRecipient,
    Session,
}

impl ErrorKind {
    /// Whether this is one of the signer selection and signing failures.
    pub const fn is_signer_error(self) -> bool {
        matches!(
            self,
            Self::SignerUnavailable
                | Self::NoPasskeyRegistered
                | Self::MissingAuthContext
                | Self::ProviderRejected
        )
    }

    /// Whether the run was rejected before any transaction was dispatched.
    pub const fn is_validation_error(self) -> bool {
        matches!(
            self,
            Self::InvalidAmount
                | Self::InsufficientBalance
                | Self::UnsupportedNetwork
                | Self::StaleQuote
                | Self::RequestInFlight
                | Self::InvalidRecipient
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),
    #[error("insufficient {asset} balance: need {needed}, have {available}")]
    InsufficientBalance { asset: Asset, needed: U256, available: U256 },
    #[error("chain {chain_id} is not supported")]
    UnsupportedNetwork { chain_id: u64 },
    #[error(transparent)]
    Signer(#[from] WalletSignerError),
    #[error("approval failed: {reason}")]
    ApprovalFailed { reason: String, hash: Option<TxHash> },
    #[error("swap failed: {reason}")]
    SwapExecutionFailed { reason: String, hash: Option<TxHash> },
    #[error("transfer failed: {reason}")]
    TransferFailed { reason: String, hash: Option<TxHash> },
    #[error("faucet claim failed: {reason}")]
    FaucetFailed { reason: String, hash: Option<TxHash> },
    #[error("transaction {hash} was not confirmed within {}s", timeout.as_secs())]
    Timeout { hash: TxHash, timeout: Duration },
    #[error("failed to read {what}: {reason}")]
    ReadFailure { what: &'static str, reason: String },
    #[error("the quote was computed for a different request")]
    StaleQuote,
    #[error("a request for {account} is already in flight")]
    RequestInFlight { account: Address },
    #[error("can not transfer to the zero address")]
    InvalidRecipient,
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<&WalletSignerError> for ErrorKind {
    fn from(err: &WalletSignerError) -> Self {
        match err {
            WalletSignerError::NoPasskeyRegistered { .. } => Self::NoPasskeyRegistered,
            WalletSignerError::MissingAuthContext { .. } => Self::MissingAuthContext,
            WalletSignerError::ProviderRejected(_) => Self::ProviderRejected,
            _ => Self::SignerUnavailable,
        }
    }
}

impl SwapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::UnsupportedNetwork { .. } => ErrorKind::UnsupportedNetwork,
            Self::Signer(err) => err.into(),
            Self::ApprovalFailed { .. } => ErrorKind::ApprovalFailed,
            Self::SwapExecutionFailed { .. } => ErrorKind::SwapExecutionFailed,
            Self::TransferFailed { .. } => ErrorKind::TransferFailed,
            Self::FaucetFailed { .. } => ErrorKind::FaucetFailed,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ReadFailure { .. } => ErrorKind::ReadFailure,
            Self::StaleQuote => ErrorKind::StaleQuote,
            Self::RequestInFlight { .. } => ErrorKind::RequestInFlight,
            Self::InvalidRecipient => ErrorKind::InvalidRecipient,
            Self::Session(_) => ErrorKind::Session,
        }
    }

    /// The hash of the transaction the failure belongs to, if one was dispatched.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::ApprovalFailed { hash, .. }
            | Self::SwapExecutionFailed { hash, .. }
            | Self::TransferFailed { hash, .. }
            | Self::FaucetFailed { hash, .. } => *hash,
            Self::Timeout { hash, .. } => Some(*hash),
            _ => None,
        }
    }

    pub(crate) fn read(what: &'static str, err: &eyre::Report) -> Self {
        Self::ReadFailure { what, reason: metaswap_common::errors::display_chain(err) }
    }
}
