//! Core topology types for NetScope

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scope sentinel selecting every client in the snapshot
pub const ALL_CLIENTS: &str = "all_clients";

/// Older consoles spell the sentinel in the singular
const LEGACY_ALL_CLIENTS: &str = "all_client";

/// A device as reported by one client's adjacency scan.
///
/// `id` is stable across snapshots for the same physical device (usually the
/// LLDP chassis MAC). Attributes the controller adds beyond the well-known
/// ones are kept in `extra` and passed through to the renderer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub modelname: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: String::new(),
            ip_address: String::new(),
            modelname: String::new(),
            mac_address: String::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = ip.into();
        self
    }
}

/// An adjacency between two devices, keyed by `edge_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLink {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_port: String,
    #[serde(default)]
    pub target_port: String,
    #[serde(default)]
    pub edge_data: String,
    #[serde(default)]
    pub blocked_port: bool,
    #[serde(default)]
    pub link_flow: bool,
}

impl RawLink {
    /// Build a link whose edge key follows the `min_max` convention.
    pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        let edge_data = edge_key(&source, &target);
        Self {
            source,
            target,
            source_port: String::new(),
            target_port: String::new(),
            edge_data,
            blocked_port: false,
            link_flow: true,
        }
    }

    pub fn with_ports(
        mut self,
        source_port: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.source_port = source_port.into();
        self.target_port = target_port.into();
        self
    }

    pub fn blocked(mut self, blocked: bool) -> Self {
        self.blocked_port = blocked;
        self.link_flow = !blocked;
        self
    }
}

/// Conventional undirected edge key: `min(a,b)_max(a,b)`
pub fn edge_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}_{}", a, b)
    } else {
        format!("{}_{}", b, a)
    }
}

/// One client's (controller's) view of the network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientTopology {
    #[serde(default)]
    pub node_data: Vec<RawNode>,
    #[serde(default)]
    pub link_data: Vec<RawLink>,
}

impl ClientTopology {
    pub fn new(node_data: Vec<RawNode>, link_data: Vec<RawLink>) -> Self {
        Self { node_data, link_data }
    }
}

/// A node ready for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    #[serde(flatten)]
    pub node: RawNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Image reference for the device model
    #[serde(default)]
    pub svg: String,
}

impl RenderNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

/// A link ready for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderLink {
    #[serde(flatten)]
    pub link: RawLink,
    /// Presentation override; set for links crossing a blocked port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// The assembled graph handed to the renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderableGraph {
    pub nodes: Vec<RenderNode>,
    pub links: Vec<RenderLink>,
}

impl RenderableGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.node.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }
}

/// Which part of the snapshot is rendered
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScopeSelection {
    #[default]
    AllClients,
    Client(String),
}

impl ScopeSelection {
    pub fn client(id: impl Into<String>) -> Self {
        Self::from(id.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ScopeSelection::AllClients)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ScopeSelection::AllClients => ALL_CLIENTS,
            ScopeSelection::Client(id) => id,
        }
    }
}

impl From<String> for ScopeSelection {
    fn from(s: String) -> Self {
        match s.as_str() {
            ALL_CLIENTS | LEGACY_ALL_CLIENTS => ScopeSelection::AllClients,
            _ => ScopeSelection::Client(s),
        }
    }
}

impl From<&str> for ScopeSelection {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ScopeSelection> for String {
    fn from(scope: ScopeSelection) -> Self {
        match scope {
            ScopeSelection::AllClients => ALL_CLIENTS.to_string(),
            ScopeSelection::Client(id) => id,
        }
    }
}

impl std::fmt::Display for ScopeSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_sentinels() {
        assert_eq!(ScopeSelection::from("all_clients"), ScopeSelection::AllClients);
        assert_eq!(ScopeSelection::from("all_client"), ScopeSelection::AllClients);
        assert_eq!(
            ScopeSelection::from("10.0.0.5"),
            ScopeSelection::Client("10.0.0.5".to_string())
        );

        let json = serde_json::to_string(&ScopeSelection::AllClients).unwrap();
        assert_eq!(json, "\"all_clients\"");
        let scope: ScopeSelection = serde_json::from_str("\"client-a\"").unwrap();
        assert_eq!(scope.as_str(), "client-a");
    }

    #[test]
    fn test_edge_key_is_order_independent() {
        assert_eq!(edge_key("b", "a"), "a_b");
        assert_eq!(edge_key("a", "b"), "a_b");
        assert_eq!(RawLink::between("n1", "n1").edge_data, "n1_n1");
    }

    #[test]
    fn test_node_wire_format() {
        let node: RawNode = serde_json::from_value(serde_json::json!({
            "id": "00:60:e9:1a:2b:3c",
            "model": "EHG7512",
            "ipAddress": "10.0.50.1",
            "modelname": "EHG7512-8PoE",
            "firmware": "v1.2"
        }))
        .unwrap();
        assert_eq!(node.ip_address, "10.0.50.1");
        assert_eq!(node.mac_address, "");
        assert_eq!(node.extra.get("firmware"), Some(&serde_json::json!("v1.2")));

        let out = serde_json::to_value(&node).unwrap();
        assert_eq!(out["ipAddress"], "10.0.50.1");
        assert_eq!(out["firmware"], "v1.2");
    }

    #[test]
    fn test_render_node_omits_unset_position() {
        let node = RenderNode {
            node: RawNode::new("n1"),
            x: None,
            y: None,
            svg: "/img/EHG2408.png".to_string(),
        };
        let out = serde_json::to_value(&node).unwrap();
        assert!(out.get("x").is_none());
        assert!(out.get("y").is_none());
        assert_eq!(out["id"], "n1");

        let back: RenderNode = serde_json::from_value(out).unwrap();
        assert_eq!(back, node);
    }
}
