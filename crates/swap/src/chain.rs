//! The active network and its deployed contracts.

use crate::error::SwapError;
use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use eyre::WrapErr;
use metaswap_common::ChainClient;
use metaswap_config::{ChainProfile, ChainRegistry, ContractBinding, ContractRegistry};
use metaswap_wallets::{InjectedProvider, ProviderError, Session, WalletSignerError};
use std::{fmt, sync::Arc};

/// Everything the orchestrators need to know about the chain they run on.
#[derive(Clone)]
pub struct ChainContext {
    profile: ChainProfile,
    binding: Option<ContractBinding>,
    client: Arc<dyn ChainClient>,
}

impl fmt::Debug for ChainContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainContext")
            .field("chain_id", &self.profile.chain_id)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl ChainContext {
    pub fn new(
        profile: ChainProfile,
        binding: Option<ContractBinding>,
        client: Arc<dyn ChainClient>,
    ) -> Self {
        Self { profile, binding, client }
    }

    pub fn chain_id(&self) -> u64 {
        self.profile.chain_id
    }

    pub fn profile(&self) -> &ChainProfile {
        &self.profile
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    /// The deployed contracts, or [`SwapError::UnsupportedNetwork`] if there are none.
    pub fn binding(&self) -> Result<ContractBinding, SwapError> {
        self.binding.ok_or(SwapError::UnsupportedNetwork { chain_id: self.profile.chain_id })
    }

    pub fn is_deployed(&self) -> bool {
        self.binding.is_some()
    }

    /// Executes a read only `call` against `to` and decodes its return value.
    pub async fn read<C: SolCall + Send + Sync>(
        &self,
        to: Address,
        call: &C,
    ) -> eyre::Result<C::Return> {
        let output = self.client.call(to, call.abi_encode().into()).await?;
        C::abi_decode_returns(&output)
            .wrap_err_with(|| format!("failed to decode the result of {}", C::SIGNATURE))
    }
}

/// The supported chains and the contracts deployed on them.
#[derive(Clone, Debug, Default)]
pub struct Networks {
    pub chains: ChainRegistry,
    pub contracts: ContractRegistry,
}

impl Networks {
    pub fn new(chains: ChainRegistry, contracts: ContractRegistry) -> Self {
        Self { chains, contracts }
    }

    /// Builds the context of `chain_id`, talking to it through `client`.
    pub fn context(
        &self,
        chain_id: u64,
        client: Arc<dyn ChainClient>,
    ) -> Result<ChainContext, SwapError> {
        let profile =
            self.chains.resolve(chain_id).ok_or(SwapError::UnsupportedNetwork { chain_id })?;
        Ok(ChainContext::new(profile.clone(), self.contracts.resolve(chain_id), client))
    }

    /// Picks the chain to work on.
    ///
    /// The injected wallet's chain wins if it is supported, then the saved selection, then
    /// `default`. A fallback to `default` is written back to the session.
    pub fn resolve_active_chain(
        &self,
        injected: Option<u64>,
        session: &mut Session,
        default: u64,
    ) -> Result<u64, SwapError> {
        if let Some(chain_id) = injected.filter(|id| self.chains.is_supported(*id)) {
            return Ok(chain_id);
        }
        if let Some(chain_id) = session.selected_chain().filter(|id| self.chains.is_supported(*id))
        {
            return Ok(chain_id);
        }
        if !self.chains.is_supported(default) {
            return Err(SwapError::UnsupportedNetwork { chain_id: default });
        }
        session.set_selected_chain(default)?;
        Ok(default)
    }

    /// Selects `chain_id` and asks the injected wallet, if any, to follow.
    ///
    /// A wallet that does not know the chain yet is asked to add it first.
    #[instrument(skip(self, session, provider))]
    pub async fn switch_chain(
        &self,
        session: &mut Session,
        provider: Option<&dyn InjectedProvider>,
        chain_id: u64,
    ) -> Result<&ChainProfile, SwapError> {
        let profile =
            self.chains.resolve(chain_id).ok_or(SwapError::UnsupportedNetwork { chain_id })?;
        session.set_selected_chain(chain_id)?;

        let Some(provider) = provider else { return Ok(profile) };
        match provider.switch_chain(chain_id).await {
            Ok(()) => {}
            Err(ProviderError::ChainNotAdded(_)) => {
                debug!(chain_id, "wallet does not know the chain, adding it");
                provider.add_chain(&profile.add_chain_params()).await.map_err(wallet_err)?;
                provider.switch_chain(chain_id).await.map_err(wallet_err)?;
            }
            Err(err) => return Err(wallet_err(err)),
        }
        info!(chain_id, name = %profile.name, "switched chain");
        Ok(profile)
    }
}

fn wallet_err(err: ProviderError) -> SwapError {
    SwapError::Signer(WalletSignerError::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockChain, MockInjected};
    use metaswap_config::{MONAD_TESTNET_CHAIN_ID, SEPOLIA_CHAIN_ID};

    fn networks() -> Networks {
        Networks::new(ChainRegistry::default(), ContractRegistry::default())
    }

    #[test]
    fn prefers_supported_injected_chain() {
        let networks = networks();
        let mut session = Session::in_memory();
        session.set_selected_chain(MONAD_TESTNET_CHAIN_ID).unwrap();

        let id = networks.resolve_active_chain(Some(SEPOLIA_CHAIN_ID), &mut session, 1).unwrap();
        assert_eq!(id, SEPOLIA_CHAIN_ID);

        // mainnet is not supported, the saved selection is used
        let id = networks.resolve_active_chain(Some(1), &mut session, SEPOLIA_CHAIN_ID).unwrap();
        assert_eq!(id, MONAD_TESTNET_CHAIN_ID);
    }

    #[test]
    fn persists_default_chain() {
        let networks = networks();
        let mut session = Session::in_memory();
        let id = networks.resolve_active_chain(None, &mut session, SEPOLIA_CHAIN_ID).unwrap();
        assert_eq!(id, SEPOLIA_CHAIN_ID);
        assert_eq!(session.selected_chain(), Some(SEPOLIA_CHAIN_ID));
    }

    #[test]
    fn context_without_deployment_is_unsupported() {
        let ctx = networks().context(SEPOLIA_CHAIN_ID, Arc::new(MockChain::default())).unwrap();
        assert!(!ctx.is_deployed());
        assert!(matches!(
            ctx.binding(),
            Err(SwapError::UnsupportedNetwork { chain_id: SEPOLIA_CHAIN_ID })
        ));

        let err = networks().context(1, Arc::new(MockChain::default())).unwrap_err();
        assert!(matches!(err, SwapError::UnsupportedNetwork { chain_id: 1 }));
    }

    #[tokio::test]
    async fn switch_adds_unknown_chain() {
        let networks = networks();
        let mut session = Session::in_memory();
        let wallet = MockInjected::new(Vec::new()).with_known_chains([SEPOLIA_CHAIN_ID]);

        let profile = networks
            .switch_chain(&mut session, Some(&wallet), MONAD_TESTNET_CHAIN_ID)
            .await
            .unwrap();
        assert_eq!(profile.chain_id, MONAD_TESTNET_CHAIN_ID);
        assert_eq!(session.selected_chain(), Some(MONAD_TESTNET_CHAIN_ID));
        assert_eq!(wallet.added_chains(), vec![MONAD_TESTNET_CHAIN_ID]);
        assert_eq!(wallet.chain(), MONAD_TESTNET_CHAIN_ID);
    }

    #[tokio::test]
    async fn switch_rejects_unsupported_chain() {
        let mut session = Session::in_memory();
        let err = networks().switch_chain(&mut session, None, 1).await.unwrap_err();
        assert!(matches!(err, SwapError::UnsupportedNetwork { chain_id: 1 }));
        assert_eq!(session.selected_chain(), None);
    }
}
