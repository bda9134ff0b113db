//! Raw topology snapshot and ingress validation
//!
//! The controller returns `{ "<client>": { "node_data": [...], "link_data": [...] } }`.
//! The payload is validated once here; everything downstream works on typed
//! records. Malformed entries are skipped and counted rather than failing the
//! whole snapshot, so one bad client never hides the others.

use crate::types::{ClientTopology, RawLink, RawNode};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Latest per-client topology, in the order the controller listed the clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTopologySnapshot {
    clients: IndexMap<String, ClientTopology>,
}

/// Counts of entries dropped while validating a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngressReport {
    /// Client entries that were not JSON objects
    pub skipped_clients: Vec<String>,
    /// `node_data`/`link_data` sections that were absent or not arrays
    pub missing_sections: usize,
    pub skipped_nodes: usize,
    pub skipped_links: usize,
}

impl IngressReport {
    pub fn is_clean(&self) -> bool {
        self.skipped_clients.is_empty()
            && self.missing_sections == 0
            && self.skipped_nodes == 0
            && self.skipped_links == 0
    }
}

impl RawTopologySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests and fixtures
    pub fn with_client(mut self, id: impl Into<String>, topology: ClientTopology) -> Self {
        self.clients.insert(id.into(), topology);
        self
    }

    /// Parse and validate a response body.
    ///
    /// Fails only when the body is not a JSON object at the top level.
    pub fn from_slice(body: &[u8]) -> Result<(Self, IngressReport)> {
        let entries: IndexMap<String, Value> = serde_json::from_slice(body).map_err(|e| {
            Error::MalformedSnapshot(format!("expected an object of clients: {}", e))
        })?;
        Ok(Self::from_entries(entries))
    }

    /// Validate already-decoded client entries
    pub fn from_entries(entries: IndexMap<String, Value>) -> (Self, IngressReport) {
        let mut report = IngressReport::default();
        let mut clients = IndexMap::with_capacity(entries.len());

        for (client, value) in entries {
            let Value::Object(mut fields) = value else {
                warn!("Skipping client {}: entry is not an object", client);
                report.skipped_clients.push(client);
                continue;
            };

            let node_data: Vec<RawNode> = decode_records(
                &client,
                "node_data",
                fields.remove("node_data"),
                &mut report.missing_sections,
                &mut report.skipped_nodes,
            );
            let link_data: Vec<RawLink> = decode_records(
                &client,
                "link_data",
                fields.remove("link_data"),
                &mut report.missing_sections,
                &mut report.skipped_links,
            );

            clients.insert(client, ClientTopology { node_data, link_data });
        }

        (Self { clients }, report)
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn contains_client(&self, id: &str) -> bool {
        self.clients.contains_key(id)
    }

    pub fn client(&self, id: &str) -> Option<&ClientTopology> {
        self.clients.get(id)
    }

    /// Client ids in snapshot order
    pub fn client_ids(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClientTopology)> {
        self.clients.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn node_count(&self) -> usize {
        self.clients.values().map(|c| c.node_data.len()).sum()
    }

    pub fn link_count(&self) -> usize {
        self.clients.values().map(|c| c.link_data.len()).sum()
    }
}

fn decode_records<T: DeserializeOwned>(
    client: &str,
    section: &str,
    value: Option<Value>,
    missing_sections: &mut usize,
    skipped: &mut usize,
) -> Vec<T> {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => {
            warn!("Client {} has no {}", client, section);
            *missing_sections += 1;
            return Vec::new();
        }
        Some(_) => {
            warn!("Client {} has a non-array {}", client, section);
            *missing_sections += 1;
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Skipping {}[{}] of client {}: {}", section, index, client, e);
                *skipped += 1;
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_order_follows_payload() {
        let body = br#"{
            "zeta": {"node_data": [{"id": "z1"}], "link_data": []},
            "alpha": {"node_data": [{"id": "a1"}], "link_data": []},
            "mid": {"node_data": [], "link_data": []}
        }"#;
        let (snapshot, report) = RawTopologySnapshot::from_slice(body).unwrap();
        assert!(report.is_clean());
        let ids: Vec<&str> = snapshot.client_ids().collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let body = br#"{
            "good": {
                "node_data": [{"id": "n1"}, {"model": "no-id"}, 42],
                "link_data": [
                    {"source": "n1", "target": "n2", "edgeData": "n1_n2"},
                    {"edgeData": "x"}
                ]
            },
            "broken": "not an object",
            "partial": {"node_data": [{"id": "p1"}]}
        }"#;
        let (snapshot, report) = RawTopologySnapshot::from_slice(body).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.contains_client("broken"));
        assert_eq!(report.skipped_clients, vec!["broken".to_string()]);
        assert_eq!(report.skipped_nodes, 2);
        assert_eq!(report.skipped_links, 1);
        assert_eq!(report.missing_sections, 1);

        let good = snapshot.client("good").unwrap();
        assert_eq!(good.node_data.len(), 1);
        assert_eq!(good.link_data.len(), 1);

        let partial = snapshot.client("partial").unwrap();
        assert_eq!(partial.node_data[0].id, "p1");
        assert!(partial.link_data.is_empty());
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let err = RawTopologySnapshot::from_slice(b"[1,2,3]").unwrap_err();
        assert!(matches!(err, Error::MalformedSnapshot(_)));

        let err = RawTopologySnapshot::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, Error::MalformedSnapshot(_)));
    }

    #[test]
    fn test_empty_object_is_an_empty_snapshot() {
        let (snapshot, report) = RawTopologySnapshot::from_slice(b"{}").unwrap();
        assert!(snapshot.is_empty());
        assert!(report.is_clean());
    }
}
