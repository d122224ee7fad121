use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

use crate::wallet_browser::types::{BrowserRequest, BrowserResponse, Connection};

/// Shared between the bridge server and its HTTP handlers.
#[derive(Debug)]
pub(crate) struct BridgeState {
    /// Token the page must echo in `X-Session-Token`.
    token: String,
    connection: watch::Sender<Option<Connection>>,
    outbox: Mutex<Outbox>,
}

/// Requests the page has not answered yet, oldest first, each with the channel its caller is
/// waiting on.
#[derive(Debug, Default)]
struct Outbox {
    queue: VecDeque<BrowserRequest>,
    waiting: HashMap<Uuid, oneshot::Sender<BrowserResponse>>,
}

impl BridgeState {
    pub fn new() -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            connection: watch::Sender::new(None),
            outbox: Mutex::default(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn connection(&self) -> Option<Connection> {
        *self.connection.borrow()
    }

    pub fn set_connection(&self, connection: Option<Connection>) {
        self.connection.send_replace(connection);
    }

    pub fn watch_connection(&self) -> watch::Receiver<Option<Connection>> {
        self.connection.subscribe()
    }

    /// Queues `request` for the page, the receiver yields the wallet's answer.
    pub fn enqueue(&self, request: BrowserRequest) -> oneshot::Receiver<BrowserResponse> {
        let (tx, rx) = oneshot::channel();
        let mut outbox = self.outbox.lock();
        outbox.waiting.insert(request.id, tx);
        outbox.queue.push_back(request);
        rx
    }

    /// The oldest unanswered request. It stays queued until answered or cancelled.
    pub fn peek(&self) -> Option<BrowserRequest> {
        self.outbox.lock().queue.front().cloned()
    }

    /// Drops a request nobody waits for anymore.
    pub fn cancel(&self, id: &Uuid) {
        let mut outbox = self.outbox.lock();
        outbox.queue.retain(|request| request.id != *id);
        outbox.waiting.remove(id);
    }

    /// Hands `response` to the caller of its request. Returns `false` for an unknown id.
    pub fn resolve(&self, response: BrowserResponse) -> bool {
        let mut outbox = self.outbox.lock();
        let Some(tx) = outbox.waiting.remove(&response.id) else { return false };
        outbox.queue.retain(|request| request.id != response.id);
        // the caller may have given up in the meantime
        let _ = tx.send(response);
        true
    }
}
