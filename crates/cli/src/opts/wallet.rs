use alloy_primitives::Address;
use clap::Parser;
use eyre::{Result, WrapErr};
use metaswap_common::RpcChainClient;
use metaswap_config::Config;
use metaswap_wallets::{
    BrowserWallet, BrowserWalletServer, InjectedProvider, RemoteSignerClient,
    RemoteSigningService, RpcInjectedProvider, StaticStamper,
};
use std::{sync::Arc, time::Duration};

/// Header carrying the passkey stamp of a remote signer request.
pub const STAMP_HEADER: &str = "X-Stamp-WebAuthn";

/// How long to wait for the browser page to connect a wallet.
const BROWSER_CONNECT_TIMEOUT: Duration = Duration::from_secs(300);

/// How the injected wallet, if any, is reached.
#[derive(Clone, Debug, Default, Parser)]
#[command(next_help_heading = "Wallet options")]
pub struct WalletOpts {
    /// Sign through a browser extension, bridged over a local page.
    #[arg(long, global = true, conflicts_with = "unlocked")]
    pub browser: bool,

    /// Port of the browser bridge.
    #[arg(long, global = true, value_name = "PORT", requires = "browser")]
    pub browser_port: Option<u16>,

    /// Sign with an account unlocked on the RPC endpoint, via `eth_sendTransaction`.
    #[arg(long, global = true, requires = "from")]
    pub unlocked: bool,

    /// The unlocked account to use.
    #[arg(long, global = true, value_name = "ADDRESS", env = "ETH_FROM")]
    pub from: Option<Address>,

    /// Passkey stamp authorizing remote signer requests.
    #[arg(
        long,
        global = true,
        value_name = "STAMP",
        env = "METASWAP_REMOTE_STAMP",
        hide_env_values = true
    )]
    pub remote_stamp: Option<String>,
}

/// A connected injected wallet. The browser bridge is shut down on [`Self::close`].
pub struct Injected {
    pub provider: Arc<dyn InjectedProvider>,
    server: Option<BrowserWalletServer>,
}

impl Injected {
    pub async fn close(self) -> Result<()> {
        if let Some(mut server) = self.server {
            server.stop().await.wrap_err("failed to stop the browser wallet bridge")?;
        }
        Ok(())
    }
}

impl WalletOpts {
    pub fn is_injected(&self) -> bool {
        self.browser || self.unlocked
    }

    /// Connects the injected wallet selected by the flags, if any.
    ///
    /// `client` is the endpoint an unlocked account lives on.
    pub async fn injected(
        &self,
        config: &Config,
        client: &RpcChainClient,
    ) -> Result<Option<Injected>> {
        if self.unlocked {
            let mut provider = RpcInjectedProvider::new(client.provider().clone());
            if let Some(from) = self.from {
                provider = provider.with_from(from);
            }
            return Ok(Some(Injected { provider: Arc::new(provider), server: None }));
        }
        if !self.browser {
            return Ok(None);
        }

        let port = self.browser_port.unwrap_or(config.browser_port);
        let mut server = BrowserWalletServer::new(port, config.transaction_timeout());
        server.start().await.wrap_err("failed to start the browser wallet bridge")?;
        eprintln!("Open {} in a browser with your wallet extension", server.url());
        let connection = server
            .wait_for_connection(BROWSER_CONNECT_TIMEOUT)
            .await
            .wrap_err("no wallet connected through the browser")?;
        debug!(address = %connection.address, chain_id = connection.chain_id, "wallet connected");
        let provider = Arc::new(BrowserWallet::new(server.clone()));
        Ok(Some(Injected { provider, server: Some(server) }))
    }

    /// The remote signing service, if configured.
    pub fn remote(&self, config: &Config) -> Result<Option<Arc<dyn RemoteSigningService>>> {
        let Some(api_url) = &config.remote_signer.api_url else {
            return Ok(None);
        };
        let Some(stamp) = &self.remote_stamp else {
            debug!("remote signer configured without a passkey stamp");
            return Ok(None);
        };
        let stamper = StaticStamper::new(STAMP_HEADER, stamp.clone());
        let client = RemoteSignerClient::new(api_url.clone(), stamper)
            .wrap_err("failed to create the remote signer client")?;
        Ok(Some(Arc::new(client)))
    }
}
