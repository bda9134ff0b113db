//! Layout continuity
//!
//! Node positions are keyed by node id and carried from one merged graph to
//! the next, so a live-updating topology keeps the operator's arrangement.
//! Nodes without a complete prior position are left unplaced for the renderer
//! to drop wherever it likes.

use crate::types::RenderableGraph;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Last known position of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub id: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl LayoutEntry {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x: Some(x),
            y: Some(y),
        }
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

/// Ordered node positions, at most one entry per id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LayoutEntry>", into = "Vec<LayoutEntry>")]
pub struct LayoutState {
    entries: Vec<LayoutEntry>,
}

impl From<Vec<LayoutEntry>> for LayoutState {
    /// Duplicate ids collapse onto the first slot, keeping the last value.
    fn from(raw: Vec<LayoutEntry>) -> Self {
        let mut state = LayoutState::default();
        for entry in raw {
            match state.entries.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry,
                None => state.entries.push(entry),
            }
        }
        state
    }
}

impl From<LayoutState> for Vec<LayoutEntry> {
    fn from(state: LayoutState) -> Self {
        state.entries
    }
}

impl LayoutState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Complete position for `id`, if one is known
    pub fn position(&self, id: &str) -> Option<(f64, f64)> {
        self.get(id).and_then(LayoutEntry::position)
    }

    /// Overwrite or append the position for `id`.
    ///
    /// Returns whether the state changed; recording the same move twice is a
    /// no-op the second time.
    pub fn record(&mut self, id: &str, x: f64, y: f64) -> Result<bool> {
        ensure_finite(id, x, y)?;
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if entry.position() == Some((x, y)) => Ok(false),
            Some(entry) => {
                entry.x = Some(x);
                entry.y = Some(y);
                Ok(true)
            }
            None => {
                self.entries.push(LayoutEntry::new(id, x, y));
                Ok(true)
            }
        }
    }
}

pub(crate) fn ensure_finite(id: &str, x: f64, y: f64) -> Result<()> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidPosition {
            id: id.to_string(),
            x,
            y,
        })
    }
}

/// Carry prior positions onto a freshly merged graph.
///
/// Every node gets the prior position for its id when one is complete, and
/// no position otherwise. Links are untouched.
pub fn apply_layout(mut graph: RenderableGraph, prior: &LayoutState) -> RenderableGraph {
    let positions: HashMap<&str, (f64, f64)> = prior
        .entries()
        .iter()
        .filter_map(|e| e.position().map(|p| (e.id.as_str(), p)))
        .collect();

    for node in &mut graph.nodes {
        let (x, y) = match positions.get(node.node.id.as_str()) {
            Some(&(x, y)) => (Some(x), Some(y)),
            None => (None, None),
        };
        node.x = x;
        node.y = y;
    }
    graph
}

/// Place every occurrence of `id` in the graph; returns how many were moved.
pub fn move_node(graph: &mut RenderableGraph, id: &str, x: f64, y: f64) -> usize {
    let mut moved = 0;
    for node in graph.nodes.iter_mut().filter(|n| n.node.id == id) {
        node.x = Some(x);
        node.y = Some(y);
        moved += 1;
    }
    moved
}
