//! Wire types of the daemon's HTTP surface
//!
//! Shared by the daemon handlers and the CLI client so both ends agree on
//! the JSON shapes.

use crate::types::{RenderableGraph, ScopeSelection};
use serde::{Deserialize, Serialize};

/// `GET /api/graph`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphResponse {
    pub scope: ScopeSelection,
    pub graph: RenderableGraph,
    /// Renderer presentation settings, passed through untouched
    #[serde(default)]
    pub config: serde_json::Value,
    /// Latest refresh failure, for a non-blocking notification
    #[serde(default)]
    pub last_error: Option<String>,
}

/// `GET /api/scopes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopesResponse {
    pub current: ScopeSelection,
    pub options: Vec<ScopeSelection>,
}

/// `PUT /api/scope`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRequest {
    pub scope: ScopeSelection,
}

/// `POST /api/layout/move`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_request_uses_sentinel() {
        let req = ScopeRequest {
            scope: ScopeSelection::AllClients,
        };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"scope":"all_clients"}"#);

        let legacy: ScopeRequest = serde_json::from_str(r#"{"scope":"all_client"}"#).unwrap();
        assert!(legacy.scope.is_all());
    }

    #[test]
    fn test_graph_response_tolerates_missing_extras() {
        let resp: GraphResponse =
            serde_json::from_str(r#"{"scope":"A","graph":{"nodes":[],"links":[]}}"#).unwrap();
        assert_eq!(resp.scope, ScopeSelection::client("A"));
        assert!(resp.graph.is_empty());
        assert!(resp.config.is_null());
        assert_eq!(resp.last_error, None);
    }
}
