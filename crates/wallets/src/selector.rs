//! Picks the signing backend for the active account.

use crate::{
    account::Backend, error::WalletSignerError, injected::InjectedProvider,
    remote::RemoteSigningService, session::Session, signer::WalletSigner,
};
use metaswap_common::ChainClient;
use std::sync::Arc;

/// Chooses between the injected wallet and the remote signer.
///
/// An injected provider with a connected account always wins, regardless of how the user
/// originally logged in. Otherwise the session must hold a remote signer account with a known
/// organization and at least one registered passkey.
#[derive(Clone, Default)]
pub struct SignerSelector {
    injected: Option<Arc<dyn InjectedProvider>>,
    remote: Option<Arc<dyn RemoteSigningService>>,
}

impl std::fmt::Debug for SignerSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerSelector")
            .field("injected", &self.injected.is_some())
            .field("remote", &self.remote.is_some())
            .finish()
    }
}

impl SignerSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_injected(mut self, provider: Arc<dyn InjectedProvider>) -> Self {
        self.injected = Some(provider);
        self
    }

    pub fn with_remote(mut self, service: Arc<dyn RemoteSigningService>) -> Self {
        self.remote = Some(service);
        self
    }

    pub fn injected(&self) -> Option<&Arc<dyn InjectedProvider>> {
        self.injected.as_ref()
    }

    /// Produces the signer for the next operation on `chain`.
    pub async fn select(
        &self,
        session: &Session,
        chain: Arc<dyn ChainClient>,
    ) -> Result<WalletSigner, WalletSignerError> {
        if let Some(provider) = &self.injected {
            match provider.accounts().await {
                Ok(accounts) => {
                    if let Some(&address) = accounts.first() {
                        trace!(%address, "using injected wallet");
                        return Ok(WalletSigner::external(address, provider.clone(), chain));
                    }
                }
                Err(err) => debug!(%err, "injected provider has no accounts"),
            }
        }

        let Some(service) = &self.remote else {
            return Err(WalletSignerError::SignerUnavailable);
        };
        let Some(account) =
            session.account().filter(|account| account.backend == Backend::RemoteSigner)
        else {
            return Err(WalletSignerError::SignerUnavailable);
        };
        let Some(auth) = account.auth.clone() else {
            return Err(WalletSignerError::MissingAuthContext { address: account.address });
        };

        let authenticators = service.authenticators(&auth).await?;
        if authenticators.is_empty() {
            return Err(WalletSignerError::NoPasskeyRegistered { user_id: auth.user_id });
        }

        trace!(
            address = %account.address,
            organization = %auth.organization_id,
            "using remote signer"
        );
        Ok(WalletSigner::remote(account.address, auth, service.clone(), chain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        account::{AccountHandle, AuthContext},
        injected::ProviderError,
        remote::{Authenticator, RemoteSignerError},
    };
    use alloy_primitives::{Address, Bytes, TxHash, U256};
    use alloy_rpc_types::TransactionRequest;
    use metaswap_common::ReceiptOutcome;
    use metaswap_config::AddChainParams;
    use parking_lot::Mutex;
    use std::time::Duration;

    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);

    #[derive(Default)]
    struct Injected {
        accounts: Vec<Address>,
        sent: Mutex<Vec<TransactionRequest>>,
    }

    #[async_trait::async_trait]
    impl InjectedProvider for Injected {
        async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
            Ok(self.accounts.clone())
        }

        async fn chain_id(&self) -> Result<u64, ProviderError> {
            Ok(11155111)
        }

        async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError> {
            self.sent.lock().push(tx);
            Ok(TxHash::repeat_byte(0x11))
        }

        async fn switch_chain(&self, _chain_id: u64) -> Result<(), ProviderError> {
            Ok(())
        }

        async fn add_chain(&self, _params: &AddChainParams) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Remote {
        passkeys: usize,
        signed: Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl RemoteSigningService for Remote {
        async fn authenticators(
            &self,
            _auth: &AuthContext,
        ) -> Result<Vec<Authenticator>, RemoteSignerError> {
            Ok((0..self.passkeys)
                .map(|i| Authenticator {
                    authenticator_id: format!("a-{i}"),
                    authenticator_name: String::new(),
                })
                .collect())
        }

        async fn sign_transaction(
            &self,
            _auth: &AuthContext,
            _address: Address,
            _tx: &TransactionRequest,
        ) -> Result<Bytes, RemoteSignerError> {
            *self.signed.lock() += 1;
            Ok(Bytes::from_static(&[0x02]))
        }
    }

    struct Chain;

    #[async_trait::async_trait]
    impl ChainClient for Chain {
        async fn balance(&self, _owner: Address) -> eyre::Result<U256> {
            Ok(U256::ZERO)
        }

        async fn call(&self, _to: Address, _data: Bytes) -> eyre::Result<Bytes> {
            Ok(Bytes::new())
        }

        async fn prepare(&self, tx: TransactionRequest) -> eyre::Result<TransactionRequest> {
            Ok(tx)
        }

        async fn send_raw(&self, _raw: Bytes) -> eyre::Result<TxHash> {
            Ok(TxHash::repeat_byte(0x22))
        }

        async fn raw_request(
            &self,
            method: &'static str,
            _params: serde_json::Value,
        ) -> eyre::Result<serde_json::Value> {
            eyre::bail!("{method} is not supported")
        }

        async fn wait_for_receipt(
            &self,
            _hash: TxHash,
            _timeout: Duration,
        ) -> eyre::Result<ReceiptOutcome> {
            Ok(ReceiptOutcome::Confirmed { block_number: Some(1), gas_used: 21_000 })
        }
    }

    fn remote_session(auth: Option<AuthContext>) -> Session {
        let mut session = Session::in_memory();
        session.connect(AccountHandle::remote(BOB, auth)).unwrap();
        session
    }

    fn auth() -> AuthContext {
        AuthContext { user_id: "user-1".to_string(), organization_id: "org-1".to_string() }
    }

    #[tokio::test]
    async fn injected_account_wins() {
        let injected = Arc::new(Injected { accounts: vec![ALICE], ..Default::default() });
        let selector = SignerSelector::new()
            .with_injected(injected.clone())
            .with_remote(Arc::new(Remote { passkeys: 1, ..Default::default() }));

        // the session still holds the remote signer login
        let signer = selector.select(&remote_session(Some(auth())), Arc::new(Chain)).await.unwrap();
        assert_eq!(signer.backend(), Backend::ExternalWallet);
        assert_eq!(signer.address(), ALICE);

        let hash = signer.send_transaction(BOB, Bytes::new(), U256::from(5)).await.unwrap();
        assert_eq!(hash, TxHash::repeat_byte(0x11));
        assert_eq!(injected.sent.lock()[0].value, Some(U256::from(5)));
    }

    #[tokio::test]
    async fn falls_back_to_remote_signer() {
        let remote = Arc::new(Remote { passkeys: 1, ..Default::default() });
        let selector = SignerSelector::new()
            .with_injected(Arc::new(Injected::default()))
            .with_remote(remote.clone());

        let signer = selector.select(&remote_session(Some(auth())), Arc::new(Chain)).await.unwrap();
        assert_eq!(signer.backend(), Backend::RemoteSigner);
        assert_eq!(signer.address(), BOB);

        let hash = signer.send_transaction(ALICE, Bytes::new(), U256::ZERO).await.unwrap();
        assert_eq!(hash, TxHash::repeat_byte(0x22));
        assert_eq!(*remote.signed.lock(), 1);
    }

    #[tokio::test]
    async fn nothing_connected_is_unavailable() {
        let err = SignerSelector::new().select(&Session::in_memory(), Arc::new(Chain)).await;
        assert!(matches!(err, Err(WalletSignerError::SignerUnavailable)));

        let selector = SignerSelector::new().with_remote(Arc::new(Remote::default()));
        let err = selector.select(&Session::in_memory(), Arc::new(Chain)).await;
        assert!(matches!(err, Err(WalletSignerError::SignerUnavailable)));
    }

    #[tokio::test]
    async fn remote_requires_auth_context() {
        let selector = SignerSelector::new()
            .with_remote(Arc::new(Remote { passkeys: 1, ..Default::default() }));
        let err = selector.select(&remote_session(None), Arc::new(Chain)).await.unwrap_err();
        assert!(
            matches!(err, WalletSignerError::MissingAuthContext { address } if address == BOB),
            "{err}"
        );
    }

    #[tokio::test]
    async fn remote_requires_passkey() {
        let remote = Arc::new(Remote::default());
        let selector = SignerSelector::new().with_remote(remote.clone());
        let err =
            selector.select(&remote_session(Some(auth())), Arc::new(Chain)).await.unwrap_err();
        match err {
            WalletSignerError::NoPasskeyRegistered { user_id } => assert_eq!(user_id, "user-1"),
            other => panic!("expected NoPasskeyRegistered, got {other}"),
        }
        assert_eq!(*remote.signed.lock(), 0);
    }
}
