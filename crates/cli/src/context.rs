//! Everything a command needs: configuration, session, networks and the connected wallet.

use crate::opts::{GlobalOpts, Injected, WalletOpts};
use eyre::{Result, WrapErr, eyre};
use metaswap::{ChainContext, EventBus, Networks, Runner};
use metaswap_common::{ProviderBuilder, RpcChainClient};
use metaswap_config::Config;
use metaswap_wallets::{FileSessionStore, InjectedProvider, Session, SignerSelector, WalletSigner};
use std::sync::Arc;

/// Loaded configuration and session state.
pub struct App {
    pub config: Config,
    pub session: Session,
    pub networks: Networks,
    pub global: GlobalOpts,
}

impl App {
    pub fn load(global: GlobalOpts) -> Result<Self> {
        let config = Config::load()?;
        let chains = config.chain_registry()?;
        let contracts = config.contract_registry()?;
        if contracts.is_empty() {
            warn!(dir = %config.deployments.display(), "no contract deployments found");
        }
        let store = FileSessionStore::new(config.session_path()?);
        let session = Session::load(Arc::new(store))?;
        Ok(Self { config, session, networks: Networks::new(chains, contracts), global })
    }

    /// The chain named by `--chain`, if any.
    pub fn requested_chain(&self) -> Result<Option<u64>> {
        let Some(chain) = &self.global.chain else { return Ok(None) };
        let profile = self
            .networks
            .chains
            .find(chain)
            .ok_or_else(|| eyre!("unsupported chain `{chain}`"))?;
        Ok(Some(profile.chain_id))
    }

    /// An RPC client of `chain_id`.
    pub fn client(&self, chain_id: u64) -> Result<RpcChainClient> {
        let profile = self
            .networks
            .chains
            .resolve(chain_id)
            .ok_or_else(|| eyre!("unsupported chain {chain_id}"))?;
        let provider = ProviderBuilder::new(&profile.rpc_url)
            .build()
            .wrap_err_with(|| format!("failed to connect to {}", profile.name))?;
        Ok(RpcChainClient::new(provider)
            .with_receipt_poll_interval(self.config.receipt_poll_interval()))
    }

    /// Resolves the chain to work on.
    ///
    /// `--chain` wins and a connected wallet on another chain is asked to follow. Otherwise the
    /// wallet's chain is used if supported, then the saved selection, then the configured default.
    pub async fn active_chain(&mut self, injected: Option<&dyn InjectedProvider>) -> Result<u64> {
        let wallet_chain = match injected {
            Some(provider) => provider.chain_id().await.ok(),
            None => None,
        };
        if let Some(chain_id) = self.requested_chain()? {
            if injected.is_some() && wallet_chain != Some(chain_id) {
                self.networks.switch_chain(&mut self.session, injected, chain_id).await?;
            }
            return Ok(chain_id);
        }
        let default = self.config.chain;
        Ok(self.networks.resolve_active_chain(wallet_chain, &mut self.session, default)?)
    }

    /// The chain selected without asking any wallet.
    pub fn selected_chain(&self) -> Result<u64> {
        Ok(self.requested_chain()?.or(self.session.selected_chain()).unwrap_or(self.config.chain))
    }

    /// The context of the active chain, for commands that do not sign.
    pub async fn read_only(&mut self) -> Result<ChainContext> {
        let chain_id = self.active_chain(None).await?;
        Ok(self.networks.context(chain_id, Arc::new(self.client(chain_id)?))?)
    }

    /// Connects the wallet selected by `opts` and resolves the active chain.
    pub async fn connect(&mut self, opts: &WalletOpts) -> Result<Connected> {
        let preliminary = self.selected_chain()?;
        let client = self.client(preliminary)?;
        let injected = opts.injected(&self.config, &client).await?;
        let provider = injected.as_ref().map(|injected| injected.provider.as_ref());
        let chain_id = self.active_chain(provider).await?;
        let client = if chain_id == preliminary { client } else { self.client(chain_id)? };

        let ctx = self.networks.context(chain_id, Arc::new(client))?;
        let mut selector = SignerSelector::new();
        if let Some(injected) = &injected {
            selector = selector.with_injected(injected.provider.clone());
        }
        if let Some(remote) = opts.remote(&self.config)? {
            selector = selector.with_remote(remote);
        }
        Ok(Connected { ctx, injected, selector })
    }

    /// A runner for `ctx` honoring the configured receipt timeout.
    pub fn runner(&self, ctx: ChainContext) -> Runner {
        Runner::new(ctx, EventBus::default()).with_tx_timeout(self.config.transaction_timeout())
    }
}

/// The active chain together with the available signing backends.
pub struct Connected {
    pub ctx: ChainContext,
    pub injected: Option<Injected>,
    pub selector: SignerSelector,
}

impl Connected {
    /// Selects the signer for the next operation.
    pub async fn signer(&self, session: &Session) -> Result<WalletSigner> {
        let signer = self.selector.select(session, self.ctx.client().clone()).await?;
        info!(address = %signer.address(), backend = %signer.backend(), "signer selected");
        Ok(signer)
    }

    pub async fn close(self) -> Result<()> {
        match self.injected {
            Some(injected) => injected.close().await,
            None => Ok(()),
        }
    }
}
