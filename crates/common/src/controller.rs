//! Topology controller
//!
//! Owns the snapshot store, the scope selection, the current layout and the
//! rendered graph. Every mutation goes through one of `refresh`, `set_scope`
//! or `record_move`, each of which takes the state lock once and never holds
//! it across an await.
//!
//! Refreshes are not coalesced. Each one is tagged with a sequence number when
//! issued, and a response is applied only if it is newer than the last one
//! applied, so out-of-order completions cannot roll the snapshot back.

use crate::layout::{apply_layout, ensure_finite, move_node, LayoutState};
use crate::merge::{self, merge, MergeOptions};
use crate::snapshot::RawTopologySnapshot;
use crate::store::{load_layout_or_empty, LayoutStore};
use crate::types::{RenderableGraph, ScopeSelection};
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where snapshots come from
#[async_trait]
pub trait TopologySource: Send + Sync {
    /// Fetch the full per-client snapshot.
    ///
    /// Failures are reported as [`Error::Fetch`] with a human-readable reason.
    async fn fetch(&self) -> Result<RawTopologySnapshot>;
}

/// Result of a refresh that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// The snapshot was replaced and the graph re-merged
    Applied {
        sequence: u64,
        clients: usize,
        nodes: usize,
        links: usize,
        /// The selected client vanished and the scope fell back to all clients
        scope_reset: bool,
    },
    /// A newer refresh was applied first; this response was dropped
    Stale { sequence: u64, latest: u64 },
    /// The controller was shut down while the fetch was in flight
    Discarded { sequence: u64 },
}

struct TopologyState {
    snapshot: RawTopologySnapshot,
    scope: ScopeSelection,
    layout: LayoutState,
    /// The layout holds changes the store has not accepted yet
    layout_dirty: bool,
    graph: RenderableGraph,
    issued: u64,
    applied: u64,
    last_error: Option<String>,
    closed: bool,
}

impl TopologyState {
    fn rebuild(&mut self, options: &MergeOptions) {
        let merged = merge(&self.snapshot, &self.scope, options);
        self.graph = apply_layout(merged, &self.layout);
    }
}

/// Single writer for all topology state
pub struct TopologyController {
    source: Arc<dyn TopologySource>,
    layout_store: Arc<dyn LayoutStore>,
    options: MergeOptions,
    state: Mutex<TopologyState>,
}

impl TopologyController {
    /// Create a controller with an empty snapshot and the stored layout
    pub fn new(
        source: Arc<dyn TopologySource>,
        layout_store: Arc<dyn LayoutStore>,
        options: MergeOptions,
    ) -> Self {
        let layout = load_layout_or_empty(layout_store.as_ref());
        info!("Topology controller ready ({} stored positions)", layout.len());

        Self {
            source,
            layout_store,
            options,
            state: Mutex::new(TopologyState {
                snapshot: RawTopologySnapshot::new(),
                scope: ScopeSelection::AllClients,
                layout,
                layout_dirty: false,
                graph: RenderableGraph::default(),
                issued: 0,
                applied: 0,
                last_error: None,
                closed: false,
            }),
        }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Fetch a fresh snapshot and re-merge under the scope current at apply time.
    ///
    /// On failure the previous snapshot and graph are kept and the error is
    /// returned (and remembered as [`last_error`](Self::last_error)).
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let sequence = {
            let mut state = self.state.lock();
            state.issued += 1;
            state.issued
        };
        debug!("Refresh #{} issued", sequence);

        let fetched = self.source.fetch().await;

        let mut state = self.state.lock();
        if state.closed {
            debug!("Refresh #{} resolved after shutdown, discarding", sequence);
            return Ok(RefreshOutcome::Discarded { sequence });
        }

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if sequence > state.applied {
                    state.last_error = Some(e.to_string());
                }
                warn!("Refresh #{} failed, keeping previous snapshot: {}", sequence, e);
                return Err(e);
            }
        };

        if sequence <= state.applied {
            debug!("Refresh #{} is older than applied #{}, dropping", sequence, state.applied);
            return Ok(RefreshOutcome::Stale {
                sequence,
                latest: state.applied,
            });
        }

        let scope_reset = match &state.scope {
            ScopeSelection::Client(id) if !snapshot.contains_client(id) => {
                warn!("Client {} is no longer reported, showing all clients", id);
                true
            }
            _ => false,
        };
        if scope_reset {
            state.scope = ScopeSelection::AllClients;
        }

        state.applied = sequence;
        state.last_error = None;
        state.snapshot = snapshot;
        state.rebuild(&self.options);

        let outcome = RefreshOutcome::Applied {
            sequence,
            clients: state.snapshot.len(),
            nodes: state.graph.nodes.len(),
            links: state.graph.links.len(),
            scope_reset,
        };
        info!(
            "Applied topology #{}: {} clients, {} nodes, {} links in scope {}",
            sequence,
            state.snapshot.len(),
            state.graph.nodes.len(),
            state.graph.links.len(),
            state.scope
        );
        Ok(outcome)
    }

    /// Change the rendered scope. Never fetches.
    pub fn set_scope(&self, scope: ScopeSelection) -> Result<RenderableGraph> {
        let mut state = self.state.lock();
        if let ScopeSelection::Client(id) = &scope {
            if !state.snapshot.contains_client(id) {
                return Err(Error::UnknownScope(id.clone()));
            }
        }

        if state.scope != scope {
            debug!("Scope {} -> {}", state.scope, scope);
        }
        state.scope = scope;
        state.rebuild(&self.options);
        Ok(state.graph.clone())
    }

    /// Commit a drag: move the node in the graph, record and persist its position.
    ///
    /// The node must be in the current graph. A persistence failure is logged;
    /// the move still takes effect in memory and the next move retries the write.
    pub fn record_move(&self, id: &str, x: f64, y: f64) -> Result<()> {
        ensure_finite(id, x, y)?;

        let mut state = self.state.lock();
        if !state.graph.contains_node(id) {
            return Err(Error::UnknownNode(id.to_string()));
        }

        move_node(&mut state.graph, id, x, y);
        let changed = state.layout.record(id, x, y)?;
        if !changed && !state.layout_dirty {
            return Ok(());
        }

        match self.layout_store.save(&state.layout) {
            Ok(()) => state.layout_dirty = false,
            Err(e) => {
                warn!("Failed to persist layout after moving {}: {}", id, e);
                state.layout_dirty = true;
            }
        }
        Ok(())
    }

    /// Stop applying refreshes; in-flight fetches resolve as `Discarded`.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        info!("Topology controller shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn graph(&self) -> RenderableGraph {
        self.state.lock().graph.clone()
    }

    pub fn scope(&self) -> ScopeSelection {
        self.state.lock().scope.clone()
    }

    /// `all_clients` followed by the clients of the current snapshot
    pub fn scope_options(&self) -> Vec<ScopeSelection> {
        merge::scope_options(&self.state.lock().snapshot)
    }

    pub fn snapshot(&self) -> RawTopologySnapshot {
        self.state.lock().snapshot.clone()
    }

    pub fn layout(&self) -> LayoutState {
        self.state.lock().layout.clone()
    }

    /// Message of the latest refresh failure not superseded by a success
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    /// Sequence number of the most recently issued refresh
    pub fn issued_sequence(&self) -> u64 {
        self.state.lock().issued
    }

    /// Sequence number of the snapshot currently held
    pub fn applied_sequence(&self) -> u64 {
        self.state.lock().applied
    }
}
