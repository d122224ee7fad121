//! The uniform signing capability handed to the orchestrators.

use crate::{
    account::{AuthContext, Backend},
    error::WalletSignerError,
    injected::InjectedProvider,
    remote::RemoteSigningService,
};
use alloy_primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use metaswap_common::{ChainClient, ReceiptOutcome};
use std::{fmt, sync::Arc, time::Duration};

/// The backend that signs for a [`WalletSigner`].
#[derive(Clone)]
pub enum SignerBackend {
    /// An injected wallet that signs and broadcasts in one step.
    External(Arc<dyn InjectedProvider>),
    /// A remote signing service; the signed transaction is broadcast through the chain client.
    Remote { auth: AuthContext, service: Arc<dyn RemoteSigningService> },
}

impl fmt::Debug for SignerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External(_) => f.write_str("External"),
            Self::Remote { auth, .. } => f.debug_struct("Remote").field("auth", auth).finish(),
        }
    }
}

/// Signs and sends transactions for one account on one chain.
///
/// A signer is selected once per operation. Connecting another backend later does not
/// affect a signer already handed out.
#[derive(Clone)]
pub struct WalletSigner {
    address: Address,
    backend: SignerBackend,
    chain: Arc<dyn ChainClient>,
}

impl fmt::Debug for WalletSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSigner")
            .field("address", &self.address)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl WalletSigner {
    pub fn external(
        address: Address,
        provider: Arc<dyn InjectedProvider>,
        chain: Arc<dyn ChainClient>,
    ) -> Self {
        Self { address, backend: SignerBackend::External(provider), chain }
    }

    pub fn remote(
        address: Address,
        auth: AuthContext,
        service: Arc<dyn RemoteSigningService>,
        chain: Arc<dyn ChainClient>,
    ) -> Self {
        Self { address, backend: SignerBackend::Remote { auth, service }, chain }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn backend(&self) -> Backend {
        match self.backend {
            SignerBackend::External(_) => Backend::ExternalWallet,
            SignerBackend::Remote { .. } => Backend::RemoteSigner,
        }
    }

    /// Dispatches a call of `data` to `to` carrying `value`.
    #[instrument(skip(self, data), fields(from = %self.address, backend = %self.backend()))]
    pub async fn send_transaction(
        &self,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<TxHash, WalletSignerError> {
        let tx = TransactionRequest {
            from: Some(self.address),
            to: Some(TxKind::Call(to)),
            value: Some(value),
            input: TransactionInput::new(data),
            ..Default::default()
        };

        let hash = match &self.backend {
            SignerBackend::External(provider) => provider.send_transaction(tx).await?,
            SignerBackend::Remote { auth, service } => {
                let tx =
                    self.chain.prepare(tx).await.map_err(|err| WalletSignerError::chain(&err))?;
                let raw = service.sign_transaction(auth, self.address, &tx).await?;
                self.chain.send_raw(raw).await.map_err(|err| WalletSignerError::chain(&err))?
            }
        };
        debug!(tx_hash = %hash, "transaction dispatched");
        Ok(hash)
    }

    pub async fn wait_for_receipt(
        &self,
        hash: TxHash,
        timeout: Duration,
    ) -> Result<ReceiptOutcome, WalletSignerError> {
        self.chain
            .wait_for_receipt(hash, timeout)
            .await
            .map_err(|err| WalletSignerError::chain(&err))
    }
}
