//! Graph merging
//!
//! Derives the renderable graph from a raw snapshot for the requested scope.
//! Merging is a pure function of `(snapshot, scope, options)`: the same inputs
//! always produce the same nodes and links in the same order.

use crate::snapshot::RawTopologySnapshot;
use crate::types::{
    ClientTopology, RawLink, RawNode, RenderLink, RenderNode, RenderableGraph, ScopeSelection,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do with nodes whose `id` (or links whose `edgeData`) is empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyIdPolicy {
    /// Drop the record from the rendered graph
    #[default]
    Skip,
    /// Render the record as-is
    Include,
}

/// Maps device models to image references for the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageCatalog {
    /// Prefix joined to every image path
    pub base_url: String,
    /// Image used for models without an explicit entry
    pub default_image: String,
    /// Model name -> image path
    pub models: BTreeMap<String, String>,
}

impl Default for ImageCatalog {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert("EHG7512".to_string(), "EHG7512.png".to_string());
        models.insert("EHG2408".to_string(), "EHG2408.png".to_string());
        Self {
            base_url: "/assets/images".to_string(),
            default_image: "EHG2408.png".to_string(),
            models,
        }
    }
}

impl ImageCatalog {
    /// Image reference for a device model
    pub fn resolve(&self, model: &str) -> String {
        let image = self.models.get(model).unwrap_or(&self.default_image);
        let base = self.base_url.trim_end_matches('/');
        if base.is_empty() {
            image.clone()
        } else {
            format!("{}/{}", base, image.trim_start_matches('/'))
        }
    }
}

/// Merge behaviour knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    pub empty_ids: EmptyIdPolicy,
    /// Colour given to links that cross a blocked (ring-protection) port
    pub blocked_link_color: String,
    pub images: ImageCatalog,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            empty_ids: EmptyIdPolicy::Skip,
            blocked_link_color: "orange".to_string(),
            images: ImageCatalog::default(),
        }
    }
}

/// Merge a snapshot into a renderable graph for `scope`.
///
/// `AllClients` concatenates every client in snapshot order without
/// de-duplicating nodes that appear under several clients. A client scope
/// that is not in the snapshot yields an empty graph. Positions are left
/// unset; see [`crate::layout::apply_layout`].
pub fn merge(
    snapshot: &RawTopologySnapshot,
    scope: &ScopeSelection,
    options: &MergeOptions,
) -> RenderableGraph {
    let mut graph = RenderableGraph::default();
    match scope {
        ScopeSelection::AllClients => {
            for (_, client) in snapshot.iter() {
                merge_client(client, options, &mut graph);
            }
        }
        ScopeSelection::Client(id) => {
            if let Some(client) = snapshot.client(id) {
                merge_client(client, options, &mut graph);
            }
        }
    }
    graph
}

fn merge_client(client: &ClientTopology, options: &MergeOptions, graph: &mut RenderableGraph) {
    let keep_empty = options.empty_ids == EmptyIdPolicy::Include;

    graph.nodes.extend(
        client
            .node_data
            .iter()
            .filter(|node| keep_empty || !node.id.is_empty())
            .map(|node| render_node(node, options)),
    );
    graph.links.extend(
        client
            .link_data
            .iter()
            .filter(|link| keep_empty || !link.edge_data.is_empty())
            .map(|link| render_link(link, options)),
    );
}

pub fn render_node(node: &RawNode, options: &MergeOptions) -> RenderNode {
    RenderNode {
        node: node.clone(),
        x: None,
        y: None,
        svg: options.images.resolve(&node.model),
    }
}

/// Blocked links get the distinguished colour; identity fields are untouched.
pub fn render_link(link: &RawLink, options: &MergeOptions) -> RenderLink {
    RenderLink {
        link: link.clone(),
        color: link.blocked_port.then(|| options.blocked_link_color.clone()),
    }
}

/// Client ids in snapshot order
pub fn clients(snapshot: &RawTopologySnapshot) -> Vec<String> {
    snapshot.client_ids().map(str::to_string).collect()
}

/// Entries for the scope selector: `all_clients` followed by every client.
///
/// Client ids are taken verbatim, so a client named like the sentinel still
/// gets its own entry.
pub fn scope_options(snapshot: &RawTopologySnapshot) -> Vec<ScopeSelection> {
    std::iter::once(ScopeSelection::AllClients)
        .chain(snapshot.client_ids().map(|id| ScopeSelection::Client(id.to_string())))
        .collect()
}
