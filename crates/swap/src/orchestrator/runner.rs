use crate::{
    balance::{BalanceReader, Balances},
    chain::ChainContext,
    error::SwapError,
    lifecycle::{EventBus, LifecycleEvent, LifecycleKind, OrchestratorState, TxLifecycle},
    request::Asset,
};
use alloy_primitives::{Address, Bytes, TxHash, U256};
use metaswap_common::ReceiptOutcome;
use metaswap_wallets::WalletSigner;
use parking_lot::Mutex;
use serde::Serialize;
use std::{collections::HashSet, sync::Arc, time::Duration};
use uuid::Uuid;

/// Default bound of a receipt wait.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(120);

/// Accounts with a run in flight.
///
/// Owned by a [`Runner`]. Orchestrators see each other's runs only when built from the same
/// runner or from runners derived with [`Runner::with_context`].
#[derive(Clone, Debug, Default)]
pub struct InFlight {
    accounts: Arc<Mutex<HashSet<Address>>>,
}

impl InFlight {
    /// Marks `account` busy until the returned guard is dropped.
    pub fn acquire(&self, account: Address) -> Result<InFlightGuard, SwapError> {
        if !self.accounts.lock().insert(account) {
            return Err(SwapError::RequestInFlight { account });
        }
        Ok(InFlightGuard { accounts: self.accounts.clone(), account })
    }

    pub fn is_busy(&self, account: Address) -> bool {
        self.accounts.lock().contains(&account)
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    accounts: Arc<Mutex<HashSet<Address>>>,
    account: Address,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.accounts.lock().remove(&self.account);
    }
}

/// What a completed run produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub run: Uuid,
    /// Every transaction dispatched by the run, in order.
    pub transactions: Vec<TxLifecycle>,
    /// Balances read after the last confirmation.
    pub balances: Balances,
}

impl Outcome {
    /// The hash of the last dispatched transaction.
    pub fn tx_hash(&self) -> Option<TxHash> {
        self.transactions.last().and_then(|tx| tx.hash)
    }
}

/// The chain, event bus and in-flight registry shared by the orchestrators of a session.
///
/// Build one runner per session and hand clones of it to every orchestrator. After a chain
/// switch, [`Self::with_context`] keeps the bus and the registry so runs on the old chain still
/// block the account.
#[derive(Clone, Debug)]
pub struct Runner {
    ctx: ChainContext,
    bus: EventBus,
    in_flight: InFlight,
    tx_timeout: Duration,
}

impl Runner {
    pub fn new(ctx: ChainContext, bus: EventBus) -> Self {
        Self { ctx, bus, in_flight: InFlight::default(), tx_timeout: DEFAULT_TX_TIMEOUT }
    }

    /// A runner for `ctx` sharing this one's event bus and in-flight registry.
    pub fn with_context(&self, ctx: ChainContext) -> Self {
        Self { ctx, ..self.clone() }
    }

    pub fn with_tx_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = timeout;
        self
    }

    pub fn context(&self) -> &ChainContext {
        &self.ctx
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    pub fn reader(&self) -> BalanceReader {
        BalanceReader::new(self.ctx.clone())
    }

    /// Starts a run for the account of `signer`, failing if it already has one.
    pub(crate) fn start<'a>(&'a self, signer: &'a WalletSigner) -> Result<Run<'a>, SwapError> {
        let guard = self.in_flight.acquire(signer.address())?;
        let run = Run {
            runner: self,
            signer,
            id: Uuid::new_v4(),
            transactions: Vec::new(),
            _guard: guard,
        };
        run.enter(OrchestratorState::Validating);
        Ok(run)
    }
}

/// A single orchestration run. Holds the account's in-flight slot until finished.
pub(crate) struct Run<'a> {
    runner: &'a Runner,
    signer: &'a WalletSigner,
    id: Uuid,
    transactions: Vec<TxLifecycle>,
    _guard: InFlightGuard,
}

impl Run<'_> {
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn ctx(&self) -> &ChainContext {
        &self.runner.ctx
    }

    pub(crate) fn owner(&self) -> Address {
        self.signer.address()
    }

    pub(crate) fn enter(&self, state: OrchestratorState) {
        debug!(run = %self.id, ?state, "orchestrator state");
        self.runner.bus.publish(LifecycleEvent::State { run: self.id, state });
    }

    fn publish_tx(&self, tx: &TxLifecycle) {
        self.runner.bus.publish(LifecycleEvent::Tx { run: self.id, tx: tx.clone() });
    }

    /// Fails with [`SwapError::InsufficientBalance`] unless `owner` holds `needed` of `asset`.
    pub(crate) async fn ensure_balance(
        &self,
        asset: Asset,
        needed: U256,
    ) -> Result<(), SwapError> {
        let available = self.runner.reader().balance_of(asset, self.owner()).await?;
        if available < needed {
            return Err(SwapError::InsufficientBalance { asset, needed, available });
        }
        Ok(())
    }

    /// Sends one transaction through the signer and waits for its receipt.
    ///
    /// An approval stays in `Approving` throughout and reports every failure as
    /// [`SwapError::ApprovalFailed`]. Other transactions move to `Confirming` once dispatched,
    /// surface signer errors verbatim and report an unanswered receipt wait as
    /// [`SwapError::Timeout`].
    #[instrument(skip(self, data), fields(run = %self.id))]
    pub(crate) async fn step(
        &mut self,
        kind: LifecycleKind,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<TxHash, SwapError> {
        let approval = kind == LifecycleKind::Approve;
        let mut tx = TxLifecycle::pending(kind);
        let hash = match self.signer.send_transaction(to, data, value).await {
            Ok(hash) => hash,
            Err(err) => {
                let err =
                    if approval { step_failure(kind, err.to_string(), None) } else { err.into() };
                tx.fail(err.kind());
                self.record(tx);
                return Err(err);
            }
        };
        tx = tx.with_hash(hash);
        self.publish_tx(&tx);
        if !approval {
            self.enter(OrchestratorState::Confirming);
        }

        let timeout = self.runner.tx_timeout;
        let result = match self.signer.wait_for_receipt(hash, timeout).await {
            Ok(ReceiptOutcome::Confirmed { block_number, .. }) => {
                debug!(tx_hash = %hash, ?block_number, "transaction confirmed");
                Ok(hash)
            }
            Ok(ReceiptOutcome::Reverted { .. }) => {
                Err(step_failure(kind, "transaction reverted".to_string(), Some(hash)))
            }
            Ok(ReceiptOutcome::TimedOut) if approval => Err(step_failure(
                kind,
                format!("not confirmed within {}s", timeout.as_secs()),
                Some(hash),
            )),
            Ok(ReceiptOutcome::TimedOut) => Err(SwapError::Timeout { hash, timeout }),
            Err(err) => {
                Err(step_failure(kind, format!("failed to fetch receipt: {err}"), Some(hash)))
            }
        };

        match &result {
            Ok(_) => tx.confirm(),
            Err(err) => tx.fail(err.kind()),
        };
        self.record(tx);
        result
    }

    fn record(&mut self, tx: TxLifecycle) {
        self.publish_tx(&tx);
        self.transactions.push(tx);
    }

    /// Publishes the terminal state, then `Idle`, and releases the in-flight slot.
    pub(crate) async fn finish(self, result: Result<(), SwapError>) -> Result<Outcome, SwapError> {
        match result {
            Ok(()) => {
                let owner = self.owner();
                let mut balances = Balances::default();
                self.runner.reader().refresh(owner, &mut balances).await;
                self.runner.bus.publish(LifecycleEvent::Balances { owner, balances });
                self.enter(OrchestratorState::Succeeded);
                self.enter(OrchestratorState::Idle);
                Ok(Outcome { run: self.id, transactions: self.transactions, balances })
            }
            Err(err) => {
                warn!(run = %self.id, kind = %err.kind(), %err, "run failed");
                self.enter(OrchestratorState::Failed(err.kind()));
                self.enter(OrchestratorState::Idle);
                Err(err)
            }
        }
    }
}

fn step_failure(kind: LifecycleKind, reason: String, hash: Option<TxHash>) -> SwapError {
    match kind {
        LifecycleKind::Approve => SwapError::ApprovalFailed { reason, hash },
        LifecycleKind::Swap => SwapError::SwapExecutionFailed { reason, hash },
        LifecycleKind::Transfer => SwapError::TransferFailed { reason, hash },
        LifecycleKind::Faucet => SwapError::FaucetFailed { reason, hash },
    }
}
