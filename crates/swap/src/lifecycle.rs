//! Lifecycle records and the events the UI consumes.

use crate::{balance::Balances, error::ErrorKind};
use alloy_primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// What a dispatched transaction does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleKind {
    Approve,
    Swap,
    Transfer,
    Faucet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

/// The record of one dispatched transaction.
///
/// Created `Pending` when the signing request is dispatched and moved to a terminal status
/// exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxLifecycle {
    pub id: Uuid,
    pub kind: LifecycleKind,
    pub status: TxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<TxHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl TxLifecycle {
    pub fn pending(kind: LifecycleKind) -> Self {
        Self { id: Uuid::new_v4(), kind, status: TxStatus::Pending, hash: None, error: None }
    }

    pub fn with_hash(mut self, hash: TxHash) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status != TxStatus::Pending
    }

    /// Moves a pending record to `Confirmed`. Returns `false` if it was already terminal.
    pub fn confirm(&mut self) -> bool {
        self.finish(TxStatus::Confirmed, None)
    }

    /// Moves a pending record to `Failed`. Returns `false` if it was already terminal.
    pub fn fail(&mut self, error: ErrorKind) -> bool {
        self.finish(TxStatus::Failed, Some(error))
    }

    fn finish(&mut self, status: TxStatus, error: Option<ErrorKind>) -> bool {
        if self.is_terminal() {
            warn!(
                id = %self.id,
                current = ?self.status,
                requested = ?status,
                "lifecycle already terminal"
            );
            return false;
        }
        self.status = status;
        self.error = error;
        true
    }
}

/// States of an orchestration run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorState {
    Idle,
    Validating,
    Approving,
    Executing,
    Confirming,
    Succeeded,
    Failed(ErrorKind),
}

impl OrchestratorState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A run entered `state`.
    State { run: Uuid, state: OrchestratorState },
    /// A transaction was dispatched or reached a terminal status.
    Tx { run: Uuid, tx: TxLifecycle },
    /// Balances of `owner` were refreshed.
    Balances { owner: Address, balances: Balances },
}

/// Fan-out of [`LifecycleEvent`]s to every subscriber.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Publishes `event`. Events without subscribers are dropped.
    pub fn publish(&self, event: LifecycleEvent) {
        trace!(?event, "lifecycle event");
        let _ = self.tx.send(event);
    }
}
