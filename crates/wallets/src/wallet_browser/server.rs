use std::{net::SocketAddr, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

use crate::wallet_browser::{
    api,
    error::BrowserWalletError,
    state::BridgeState,
    types::{BrowserRequest, Connection},
};

/// Local HTTP bridge between this process and a wallet extension running in the browser.
///
/// Clones share the same bridge.
#[derive(Debug, Clone)]
pub struct BrowserWalletServer {
    port: u16,
    timeout: Duration,
    state: Arc<BridgeState>,
    running: Arc<Mutex<Option<(oneshot::Sender<()>, JoinHandle<()>)>>>,
}

impl BrowserWalletServer {
    /// Creates a server for `port`, `0` picks a free one on [`Self::start`].
    ///
    /// `timeout` bounds how long a single request waits for the user.
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout, state: Arc::new(BridgeState::new()), running: Arc::default() }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Url of the bridge page.
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    pub fn session_token(&self) -> String {
        self.state.token().to_string()
    }

    pub fn is_connected(&self) -> bool {
        self.state.connection().is_some()
    }

    pub fn get_connection(&self) -> Option<Connection> {
        self.state.connection()
    }

    /// Binds the listener and serves in the background.
    pub async fn start(&mut self) -> Result<(), BrowserWalletError> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| BrowserWalletError::Server(format!("failed to bind {addr}: {e}")))?;
        self.port = listener
            .local_addr()
            .map_err(|e| BrowserWalletError::Server(e.to_string()))?
            .port();

        let app = api::router(self.state.clone());
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let shutdown = async move {
                let _ = rx.await;
            };
            if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
                error!(%err, "browser wallet server failed");
            }
        });

        info!(url = %self.url(), "browser wallet bridge listening");
        *self.running.lock() = Some((tx, task));
        Ok(())
    }

    /// Stops serving. Requests still waiting for the page run into their timeout.
    pub async fn stop(&mut self) -> Result<(), BrowserWalletError> {
        let Some((tx, task)) = self.running.lock().take() else { return Ok(()) };
        let _ = tx.send(());
        task.await.map_err(|e| BrowserWalletError::Server(e.to_string()))
    }

    /// Waits until the page reports a connected wallet.
    pub async fn wait_for_connection(
        &self,
        timeout: Duration,
    ) -> Result<Connection, BrowserWalletError> {
        let mut rx = self.state.watch_connection();
        let connected = async move {
            rx.wait_for(Option::is_some).await.ok().and_then(|connection| *connection)
        };
        match tokio::time::timeout(timeout, connected).await {
            Ok(Some(connection)) => Ok(connection),
            Ok(None) => Err(BrowserWalletError::Server("bridge state dropped".to_string())),
            Err(_) => Err(BrowserWalletError::Timeout { operation: "Wallet connection" }),
        }
    }

    /// Queues an EIP-1193 request and waits for the page to relay the wallet's answer.
    pub async fn request(
        &self,
        operation: &'static str,
        request: BrowserRequest,
    ) -> Result<serde_json::Value, BrowserWalletError> {
        if !self.is_connected() {
            return Err(BrowserWalletError::NotConnected);
        }

        let id = request.id;
        trace!(%id, method = %request.method, "queueing browser request");
        let answer = self.state.enqueue(request);
        let response = match tokio::time::timeout(self.timeout, answer).await {
            Ok(Ok(response)) => response,
            _ => {
                self.state.cancel(&id);
                return Err(BrowserWalletError::Timeout { operation });
            }
        };

        match (response.result, response.error) {
            (_, Some(error)) if error.code == crate::injected::USER_REJECTED_REQUEST => {
                Err(BrowserWalletError::Rejected { operation, reason: error.message })
            }
            (_, Some(error)) => {
                Err(BrowserWalletError::Rpc { operation, code: error.code, message: error.message })
            }
            (Some(result), None) => Ok(result),
            (None, None) => Err(BrowserWalletError::InvalidResponse("empty response".to_string())),
        }
    }
}
