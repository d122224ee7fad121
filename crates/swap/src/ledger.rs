//! Read-only access to the indexed swap history.

use crate::request::Direction;
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Events per history page.
pub const PAGE_SIZE: usize = 10;

/// One executed swap, in either direction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapEvent {
    pub direction: Direction,
    pub user: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub timestamp: DateTime<Utc>,
}

/// Queries the GraphQL endpoint of the swap indexer.
#[derive(Clone, Debug)]
pub struct LedgerClient {
    client: reqwest::Client,
    url: String,
}

impl LedgerClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .wrap_err("failed to build ledger http client")?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches up to `limit` most recent swaps of each direction, newest first.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn recent_swaps(&self, limit: usize) -> Result<Vec<SwapEvent>> {
        let body = serde_json::json!({ "query": recent_swaps_query(limit) });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .wrap_err_with(|| format!("failed to query ledger at {}", self.url))?
            .error_for_status()
            .wrap_err("ledger query failed")?;
        let response: GraphQlResponse =
            response.json().await.wrap_err("failed to decode ledger response")?;

        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<_> = errors.into_iter().map(|err| err.message).collect();
            eyre::bail!("ledger query returned errors: {}", messages.join("; "));
        }
        let data = response.data.ok_or_else(|| eyre::eyre!("ledger response has no data"))?;

        let mut events: Vec<SwapEvent> = data
            .native_to_token
            .into_iter()
            .map(|row| SwapEvent {
                direction: Direction::NativeToToken,
                user: row.user,
                amount_in: row.eth_in,
                amount_out: row.token_out,
                timestamp: row.timestamp,
            })
            .chain(data.token_to_native.into_iter().map(|row| SwapEvent {
                direction: Direction::TokenToNative,
                user: row.user,
                amount_in: row.token_in,
                amount_out: row.eth_out,
                timestamp: row.timestamp,
            }))
            .collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!(count = events.len(), "fetched swap history");
        Ok(events)
    }
}

fn recent_swaps_query(limit: usize) -> String {
    format!(
        "query {{ \
         SwapHub_SwapETHForToken(limit: {limit}, order_by: {{timestamp: desc}}) {{ user ethIn tokenOut timestamp }} \
         SwapHub_SwapTokenForETH(limit: {limit}, order_by: {{timestamp: desc}}) {{ user tokenIn ethOut timestamp }} \
         }}"
    )
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<RecentSwaps>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct RecentSwaps {
    #[serde(rename = "SwapHub_SwapETHForToken", default)]
    native_to_token: Vec<NativeToTokenRow>,
    #[serde(rename = "SwapHub_SwapTokenForETH", default)]
    token_to_native: Vec<TokenToNativeRow>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeToTokenRow {
    user: Address,
    eth_in: U256,
    token_out: U256,
    #[serde(deserialize_with = "unix_timestamp")]
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenToNativeRow {
    user: Address,
    token_in: U256,
    eth_out: U256,
    #[serde(deserialize_with = "unix_timestamp")]
    timestamp: DateTime<Utc>,
}

/// Unix seconds, as a JSON number or a decimal string.
fn unix_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(i64),
        Text(String),
    }

    let seconds = match Seconds::deserialize(deserializer)? {
        Seconds::Number(seconds) => seconds,
        Seconds::Text(text) => text.parse().map_err(serde::de::Error::custom)?,
    };
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| serde::de::Error::custom(format!("timestamp {seconds} is out of range")))
}

/// Fetched swap events, paged for display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapHistory {
    events: Vec<SwapEvent>,
}

impl SwapHistory {
    pub fn new(events: Vec<SwapEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[SwapEvent] {
        &self.events
    }

    pub fn total_pages(&self) -> usize {
        self.events.len().div_ceil(PAGE_SIZE)
    }

    /// The 1-based page `n`. Out of range pages are empty.
    pub fn page(&self, n: usize) -> &[SwapEvent] {
        let Some(start) = n.checked_sub(1).and_then(|page| page.checked_mul(PAGE_SIZE)) else {
            return &[];
        };
        let rest = self.events.get(start..).unwrap_or_default();
        &rest[..rest.len().min(PAGE_SIZE)]
    }
}
