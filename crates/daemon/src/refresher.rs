//! Refresh loop
//!
//! Turns refresh triggers into snapshot fetches. Every trigger gets its own
//! fetch task; ordering between overlapping fetches is settled by the
//! controller's sequence numbers.

use netscope_common::{RefreshOutcome, TopologyController};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Why a refresh was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Daemon start
    Startup,
    /// Topology-change notification on the event stream
    Push,
    /// Operator request
    Manual,
}

impl std::fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshTrigger::Startup => write!(f, "startup"),
            RefreshTrigger::Push => write!(f, "push"),
            RefreshTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Cheap handle for requesting refreshes
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::UnboundedSender<RefreshTrigger>,
}

impl RefreshHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RefreshTrigger>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn trigger(&self, trigger: RefreshTrigger) {
        if self.tx.send(trigger).is_err() {
            debug!("Refresh loop gone, dropping {} trigger", trigger);
        }
    }
}

/// Drives refreshes of the controller
pub struct Refresher {
    controller: Arc<TopologyController>,
    rx: mpsc::UnboundedReceiver<RefreshTrigger>,
}

impl Refresher {
    pub fn new(
        controller: Arc<TopologyController>,
        rx: mpsc::UnboundedReceiver<RefreshTrigger>,
    ) -> Self {
        Self { controller, rx }
    }

    /// Run until every handle is dropped
    pub async fn run(mut self) {
        info!("Refresher started");

        while let Some(trigger) = self.rx.recv().await {
            if self.controller.is_closed() {
                break;
            }
            spawn_refresh(self.controller.clone(), trigger);
        }

        info!("Refresher stopped");
    }
}

/// Fetch and apply one snapshot in the background
pub fn spawn_refresh(
    controller: Arc<TopologyController>,
    trigger: RefreshTrigger,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match controller.refresh().await {
            Ok(RefreshOutcome::Applied { sequence, .. }) => {
                debug!("{} refresh #{} applied", trigger, sequence);
            }
            Ok(RefreshOutcome::Stale { sequence, latest }) => {
                debug!("{} refresh #{} superseded by #{}", trigger, sequence, latest);
            }
            Ok(RefreshOutcome::Discarded { .. }) => {}
            Err(e) => {
                warn!("{} refresh failed: {}", trigger, e);
            }
        }
    })
}
