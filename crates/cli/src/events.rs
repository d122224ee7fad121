//! Renders lifecycle events as they happen.

use crate::utils::format_balance;
use metaswap::{
    Asset, EventBus, LifecycleEvent, LifecycleKind, OrchestratorState, TxLifecycle, TxStatus,
};
use metaswap_config::ChainProfile;
use std::future::Future;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use yansi::Paint;

/// Prints [`LifecycleEvent`]s to stderr.
#[derive(Clone, Debug)]
pub struct EventPrinter {
    profile: ChainProfile,
    quiet: bool,
}

impl EventPrinter {
    pub fn new(profile: ChainProfile, quiet: bool) -> Self {
        Self { profile, quiet }
    }

    pub fn print(&self, event: &LifecycleEvent) {
        if let Some(line) = self.render(event) {
            eprintln!("{line}");
        }
    }

    fn render(&self, event: &LifecycleEvent) -> Option<String> {
        if self.quiet {
            return None;
        }
        match event {
            LifecycleEvent::State { state, .. } => render_state(*state),
            LifecycleEvent::Tx { tx, .. } => Some(self.render_tx(tx)),
            LifecycleEvent::Balances { balances, .. } => Some(format!(
                "  balances: {}, {}",
                format_balance(balances.native, Asset::Native, &self.profile),
                format_balance(balances.token, Asset::Token, &self.profile),
            )),
        }
    }

    fn render_tx(&self, tx: &TxLifecycle) -> String {
        let kind = kind_name(tx.kind);
        let link = tx.hash.map(|hash| self.profile.tx_url(hash)).unwrap_or_default();
        match tx.status {
            TxStatus::Pending => format!("  {kind} transaction sent {}", link.dim()),
            TxStatus::Confirmed => format!("  {} {kind} confirmed", "✓".green()),
            TxStatus::Failed => {
                let reason = tx.error.map(|error| error.to_string()).unwrap_or_default();
                format!("  {} {kind} failed: {reason}", "✗".red())
            }
        }
    }
}

fn render_state(state: OrchestratorState) -> Option<String> {
    match state {
        OrchestratorState::Idle => None,
        OrchestratorState::Succeeded => Some("Succeeded".green().bold().to_string()),
        OrchestratorState::Failed(kind) => Some(format!("{} {kind}", "Failed:".red().bold())),
        state => Some(format!("{state:?}...").cyan().to_string()),
    }
}

fn kind_name(kind: LifecycleKind) -> &'static str {
    match kind {
        LifecycleKind::Approve => "approval",
        LifecycleKind::Swap => "swap",
        LifecycleKind::Transfer => "transfer",
        LifecycleKind::Faucet => "faucet",
    }
}

/// Drives `fut` to completion while printing every event published on `bus`.
///
/// Events still buffered when `fut` completes are printed before returning.
pub async fn stream<F: Future>(bus: &EventBus, printer: &EventPrinter, fut: F) -> F::Output {
    let mut rx = bus.subscribe();
    let mut fut = std::pin::pin!(fut);
    let output = loop {
        tokio::select! {
            biased;
            event = rx.recv() => match event {
                Ok(event) => printer.print(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "lifecycle events dropped"),
                Err(RecvError::Closed) => break (&mut fut).await,
            },
            output = &mut fut => break output,
        }
    };
    loop {
        match rx.try_recv() {
            Ok(event) => printer.print(&event),
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "lifecycle events dropped"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    output
}
