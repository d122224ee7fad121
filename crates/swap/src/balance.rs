//! Native balance, token balance and allowance reads.

use crate::{chain::ChainContext, error::SwapError, request::Asset};
use alloy_primitives::{Address, U256};
use metaswap_common::contracts::ITestToken;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{Notify, watch},
    task::JoinHandle,
};

/// Last known amounts of an account, in base units. `None` until read successfully once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    pub native: Option<U256>,
    pub token: Option<U256>,
    /// Token allowance granted to the swap contract.
    pub allowance: Option<U256>,
}

impl Balances {
    pub fn of(&self, asset: Asset) -> Option<U256> {
        match asset {
            Asset::Native => self.native,
            Asset::Token => self.token,
        }
    }

    /// Merges a round of reads, keeping the previous value of every read that failed.
    pub fn apply(&mut self, reads: BalanceReads) -> Vec<SwapError> {
        let mut errors = Vec::new();
        for (slot, read) in [
            (&mut self.native, reads.native),
            (&mut self.token, reads.token),
            (&mut self.allowance, reads.allowance),
        ] {
            match read {
                Ok(value) => *slot = Some(value),
                Err(err) => errors.push(err),
            }
        }
        errors
    }
}

/// The results of one round of independent reads.
#[derive(Debug)]
pub struct BalanceReads {
    pub native: Result<U256, SwapError>,
    pub token: Result<U256, SwapError>,
    pub allowance: Result<U256, SwapError>,
}

/// Read only access to the amounts held by an account.
#[derive(Clone, Debug)]
pub struct BalanceReader {
    ctx: ChainContext,
}

impl BalanceReader {
    pub fn new(ctx: ChainContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ChainContext {
        &self.ctx
    }

    pub async fn native(&self, owner: Address) -> Result<U256, SwapError> {
        self.ctx
            .client()
            .balance(owner)
            .await
            .map_err(|err| SwapError::read("native balance", &err))
    }

    pub async fn token(&self, owner: Address) -> Result<U256, SwapError> {
        let binding = self.ctx.binding()?;
        self.ctx
            .read(binding.token, &ITestToken::balanceOfCall { owner })
            .await
            .map_err(|err| SwapError::read("token balance", &err))
    }

    /// The amount the swap contract may currently move on behalf of `owner`.
    pub async fn allowance(&self, owner: Address) -> Result<U256, SwapError> {
        let binding = self.ctx.binding()?;
        self.ctx
            .read(binding.token, &ITestToken::allowanceCall { owner, spender: binding.swap })
            .await
            .map_err(|err| SwapError::read("allowance", &err))
    }

    pub async fn balance_of(&self, asset: Asset, owner: Address) -> Result<U256, SwapError> {
        match asset {
            Asset::Native => self.native(owner).await,
            Asset::Token => self.token(owner).await,
        }
    }

    /// Issues all three reads concurrently. A failing read does not affect the others.
    pub async fn read_all(&self, owner: Address) -> BalanceReads {
        let (native, token, allowance) =
            tokio::join!(self.native(owner), self.token(owner), self.allowance(owner));
        BalanceReads { native, token, allowance }
    }

    /// Reads everything and merges the results into `balances`, logging failed reads.
    pub async fn refresh(&self, owner: Address, balances: &mut Balances) {
        for err in balances.apply(self.read_all(owner).await) {
            warn!(%owner, chain_id = self.ctx.chain_id(), %err, "balance read failed");
        }
    }
}

/// Re-reads balances periodically and on demand.
#[derive(Debug)]
pub struct BalancePoller {
    reader: BalanceReader,
    owner: Address,
    interval: Duration,
}

impl BalancePoller {
    pub fn new(reader: BalanceReader, owner: Address, interval: Duration) -> Self {
        Self { reader, owner, interval }
    }

    /// Starts polling on the current runtime. The first round runs immediately.
    pub fn spawn(self) -> BalancePollerHandle {
        let (tx, rx) = watch::channel(Balances::default());
        let trigger = Arc::new(Notify::new());
        let task = tokio::spawn(self.run(tx, trigger.clone()));
        BalancePollerHandle { trigger, rx, task }
    }

    async fn run(self, tx: watch::Sender<Balances>, trigger: Arc<Notify>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut balances = Balances::default();
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = trigger.notified() => trace!(owner = %self.owner, "manual balance refresh"),
            }
            self.reader.refresh(self.owner, &mut balances).await;
            if tx.send(balances).is_err() {
                break;
            }
        }
    }
}

/// Controls a running [`BalancePoller`]. Polling stops when the handle is dropped.
#[derive(Debug)]
pub struct BalancePollerHandle {
    trigger: Arc<Notify>,
    rx: watch::Receiver<Balances>,
    task: JoinHandle<()>,
}

impl BalancePollerHandle {
    /// Requests a refresh outside the regular schedule.
    pub fn refresh(&self) {
        self.trigger.notify_one();
    }

    pub fn latest(&self) -> Balances {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Balances> {
        self.rx.clone()
    }
}

impl Drop for BalancePollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
