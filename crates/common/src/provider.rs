//! HTTP providers for the chain clients.

use crate::REQUEST_TIMEOUT;
use alloy_json_rpc::ErrorPayload;
use alloy_provider::{DynProvider, Provider, ProviderBuilder as AlloyProviderBuilder};
use alloy_rpc_client::RpcClient;
use alloy_transport::{TransportError, utils::guess_local_url};
use alloy_transport_http::Http;
use eyre::{Result, WrapErr, bail};
use std::{borrow::Cow, time::Duration};
use url::Url;

/// Builds a [`DynProvider`] talking JSON-RPC over HTTP to a chain's endpoint.
#[derive(Clone, Debug)]
pub struct ProviderBuilder {
    url: String,
    timeout: Duration,
    poll_interval: Option<Duration>,
}

impl ProviderBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), timeout: REQUEST_TIMEOUT, poll_interval: None }
    }

    /// Bounds every request, from connecting until the body has been read.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides how often pending transactions and filters are polled.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<DynProvider> {
        let url = parse_rpc_url(&self.url)?;
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .wrap_err("failed to build HTTP client")?;
        let is_local = guess_local_url(url.as_str());
        let mut client = RpcClient::new(Http::with_client(http, url), is_local);
        if let Some(interval) = self.poll_interval {
            client = client.with_poll_interval(interval);
        }
        let provider = AlloyProviderBuilder::new().disable_recommended_fillers();
        Ok(provider.connect_client(client).erased())
    }
}

/// Parses an endpoint, `host:port` without a scheme is taken as plain http.
fn parse_rpc_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let full =
        if raw.contains("://") { Cow::Borrowed(raw) } else { Cow::Owned(format!("http://{raw}")) };
    let url = Url::parse(&full).wrap_err_with(|| format!("invalid provider URL: {raw:?}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported provider URL scheme `{}` in {raw:?}", url.scheme());
    }
    Ok(url)
}

/// Returns the JSON-RPC error object carried by `err`, if the node answered with one.
pub fn error_payload(err: &TransportError) -> Option<&ErrorPayload> {
    err.as_error_resp()
}
