//! Minimal chain access used by the swap and wallet layers.

use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_provider::{DynProvider, Provider};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use eyre::{Result, WrapErr};
use std::{borrow::Cow, time::Duration};

/// Outcome of waiting for a transaction receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiptOutcome {
    /// The transaction was included and succeeded.
    Confirmed { block_number: Option<u64>, gas_used: u64 },
    /// The transaction was included but reverted.
    Reverted { block_number: Option<u64> },
    /// No receipt appeared within the wait bound.
    TimedOut,
}

impl ReceiptOutcome {
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Read and broadcast access to a single chain.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// Native balance of `owner`.
    async fn balance(&self, owner: Address) -> Result<U256>;

    /// Executes a read only contract call.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Fills nonce, gas limit, EIP-1559 fees and chain id of `tx`.
    async fn prepare(&self, tx: TransactionRequest) -> Result<TransactionRequest>;

    /// Broadcasts a signed, EIP-2718 encoded transaction.
    async fn send_raw(&self, raw: Bytes) -> Result<TxHash>;

    /// Performs a raw JSON-RPC request.
    async fn raw_request(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Waits until `hash` is included or `timeout` elapses.
    async fn wait_for_receipt(&self, hash: TxHash, timeout: Duration) -> Result<ReceiptOutcome>;
}

/// [`ChainClient`] backed by an alloy provider.
#[derive(Clone)]
pub struct RpcChainClient {
    provider: DynProvider,
    receipt_poll_interval: Duration,
}

impl std::fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("receipt_poll_interval", &self.receipt_poll_interval)
            .finish_non_exhaustive()
    }
}

impl RpcChainClient {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider, receipt_poll_interval: Duration::from_secs(1) }
    }

    /// Sets how often the receipt is polled while waiting.
    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Polls until the receipt shows up. Failed lookups are retried, the transaction may still
    /// be included while the node is flaky.
    async fn poll_receipt(&self, hash: TxHash) -> ReceiptOutcome {
        let mut interval = tokio::time::interval(self.receipt_poll_interval);
        loop {
            interval.tick().await;
            let receipt = match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => receipt,
                Ok(None) => {
                    trace!(%hash, "receipt not available yet");
                    continue;
                }
                Err(err) => {
                    debug!(%hash, %err, "failed to fetch receipt, retrying");
                    continue;
                }
            };
            return if receipt.status() {
                ReceiptOutcome::Confirmed {
                    block_number: receipt.block_number,
                    gas_used: receipt.gas_used,
                }
            } else {
                ReceiptOutcome::Reverted { block_number: receipt.block_number }
            };
        }
    }
}

#[async_trait::async_trait]
impl ChainClient for RpcChainClient {
    async fn balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .wrap_err_with(|| format!("failed to fetch balance of {owner}"))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default().to(to).input(TransactionInput::new(data));
        self.provider.call(tx).await.wrap_err_with(|| format!("eth_call to {to} failed"))
    }

    async fn prepare(&self, mut tx: TransactionRequest) -> Result<TransactionRequest> {
        let from = tx.from.ok_or_else(|| eyre::eyre!("transaction has no sender"))?;

        if tx.chain_id.is_none() {
            let chain_id =
                self.provider.get_chain_id().await.wrap_err("failed to fetch chain id")?;
            tx.chain_id = Some(chain_id);
        }
        if tx.nonce.is_none() {
            let nonce = self
                .provider
                .get_transaction_count(from)
                .pending()
                .await
                .wrap_err_with(|| format!("failed to fetch nonce of {from}"))?;
            tx.nonce = Some(nonce);
        }
        if tx.max_fee_per_gas.is_none() || tx.max_priority_fee_per_gas.is_none() {
            let fees = self
                .provider
                .estimate_eip1559_fees()
                .await
                .wrap_err("failed to estimate EIP-1559 fees")?;
            tx.max_fee_per_gas = Some(fees.max_fee_per_gas);
            tx.max_priority_fee_per_gas = Some(fees.max_priority_fee_per_gas);
        }
        if tx.gas.is_none() {
            tx.gas = Some(
                self.provider.estimate_gas(tx.clone()).await.wrap_err("failed to estimate gas")?,
            );
        }
        Ok(tx)
    }

    async fn send_raw(&self, raw: Bytes) -> Result<TxHash> {
        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .wrap_err("failed to broadcast signed transaction")?;
        Ok(*pending.tx_hash())
    }

    async fn raw_request(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.provider
            .raw_request::<_, serde_json::Value>(Cow::Borrowed(method), params)
            .await
            .wrap_err_with(|| format!("{method} failed"))
    }

    #[instrument(level = "debug", skip(self))]
    async fn wait_for_receipt(&self, hash: TxHash, timeout: Duration) -> Result<ReceiptOutcome> {
        match tokio::time::timeout(timeout, self.poll_receipt(hash)).await {
            Ok(outcome) => Ok(outcome),
            Err(_) => {
                warn!(%hash, ?timeout, "timed out waiting for receipt");
                Ok(ReceiptOutcome::TimedOut)
            }
        }
    }
}
