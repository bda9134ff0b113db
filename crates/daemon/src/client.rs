//! Controller REST client

use crate::config::ControllerConfig;
use async_trait::async_trait;
use netscope_common::{Error, RawTopologySnapshot, Result, TopologySource};
use std::time::Duration;
use tracing::{debug, warn};

/// Fetches topology snapshots from `GET /api/v1/topology`
pub struct HttpTopologySource {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpTopologySource {
    pub fn new(config: &ControllerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.topology_url(),
            token: config.token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TopologySource for HttpTopologySource {
    async fn fetch(&self) -> Result<RawTopologySnapshot> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| Error::Fetch(e.to_string()))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| Error::Fetch(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Fetch(failure_message(status, &body)));
        }

        let (snapshot, report) =
            RawTopologySnapshot::from_slice(&body).map_err(|e| Error::Fetch(e.to_string()))?;
        if !report.is_clean() {
            warn!(
                "Topology from {} had malformed entries: \
                 {} clients, {} nodes, {} links skipped, {} sections missing",
                self.url,
                report.skipped_clients.len(),
                report.skipped_nodes,
                report.skipped_links,
                report.missing_sections
            );
        }
        debug!("Fetched topology with {} clients", snapshot.len());
        Ok(snapshot)
    }
}

/// Human-readable reason for a non-success response.
///
/// Prefers the body the controller sent (its `error`/`message` field when it
/// is JSON), falling back to the status line.
fn failure_message(status: reqwest::StatusCode, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return status.to_string();
    }

    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(text) {
        for key in ["error", "message"] {
            if let Some(serde_json::Value::String(msg)) = fields.get(key) {
                return msg.clone();
            }
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use std::net::SocketAddr;

    async fn spawn_controller(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn source_for(addr: SocketAddr) -> HttpTopologySource {
        let config = ControllerConfig {
            base_url: format!("http://{}", addr),
            token: Some("t0ken".to_string()),
            ..Default::default()
        };
        HttpTopologySource::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_parses_snapshot() {
        let router = Router::new().route(
            "/api/v1/topology",
            get(|headers: axum::http::HeaderMap| async move {
                assert_eq!(headers["authorization"], "Bearer t0ken");
                concat!(
                    r#"{"clientX":{"node_data":[{"id":"n1"}],"link_data":"#,
                    r#"[{"source":"n1","target":"n1","edgeData":"n1_n1","blockedPort":false}]}}"#
                )
            }),
        );
        let source = source_for(spawn_controller(router).await);

        let snapshot = source.fetch().await.unwrap();
        let client = snapshot.client("clientX").unwrap();
        assert_eq!(client.node_data[0].id, "n1");
        assert_eq!(client.link_data[0].edge_data, "n1_n1");
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let router = Router::new().route(
            "/api/v1/topology",
            get(|| async { (StatusCode::UNAUTHORIZED, r#"{"error":"token expired"}"#) }),
        );
        let source = source_for(spawn_controller(router).await);

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, Error::Fetch(ref msg) if msg == "token expired"));
    }

    #[tokio::test]
    async fn test_empty_error_body_uses_status() {
        let router =
            Router::new().route("/api/v1/topology", get(|| async { StatusCode::BAD_GATEWAY }));
        let source = source_for(spawn_controller(router).await);

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, Error::Fetch(ref msg) if msg.contains("502")));
    }

    #[tokio::test]
    async fn test_transport_failure_is_a_fetch_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = source_for(addr).fetch().await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[test]
    fn test_failure_message_plain_text() {
        assert_eq!(failure_message(reqwest::StatusCode::FORBIDDEN, b" no access \n"), "no access");
        assert_eq!(failure_message(reqwest::StatusCode::FORBIDDEN, b""), "403 Forbidden");
    }
}
