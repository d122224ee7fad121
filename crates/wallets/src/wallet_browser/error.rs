use crate::injected::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum BrowserWalletError {
    #[error("{operation} rejected: {reason}")]
    Rejected { operation: &'static str, reason: String },
    #[error("browser wallet error {code} during {operation}: {message}")]
    Rpc { operation: &'static str, code: i64, message: String },
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
    #[error("browser wallet is not connected")]
    NotConnected,
    #[error("browser wallet returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("browser wallet server error: {0}")]
    Server(String),
}

impl From<BrowserWalletError> for ProviderError {
    fn from(err: BrowserWalletError) -> Self {
        match err {
            BrowserWalletError::Rejected { reason, .. } => Self::Rejected(reason),
            BrowserWalletError::Rpc { code, message, .. } => Self::from_code(code, message),
            BrowserWalletError::Timeout { operation } => Self::Timeout(operation.to_string()),
            BrowserWalletError::NotConnected => Self::Disconnected,
            err => Self::Other(err.to_string()),
        }
    }
}
