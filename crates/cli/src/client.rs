//! Daemon HTTP Client

use anyhow::{anyhow, Context, Result};
use netscope_common::{
    ErrorBody, EventRecord, GraphResponse, MoveRequest, RefreshOutcome, RenderableGraph,
    ScopeRequest, ScopeSelection, ScopesResponse,
};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for communicating with the NetScope daemon
pub struct DaemonClient {
    http: reqwest::Client,
    base_url: String,
}

impl DaemonClient {
    /// Create a new daemon client
    pub fn new(addr: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: addr.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if the daemon is healthy
    pub async fn health_check(&self) -> bool {
        match self.http.get(self.url("/health")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Current graph, scope and renderer settings
    pub async fn graph(&self) -> Result<GraphResponse> {
        let resp = self.http.get(self.url("/api/graph")).send().await?;
        decode(resp).await
    }

    pub async fn scopes(&self) -> Result<ScopesResponse> {
        let resp = self.http.get(self.url("/api/scopes")).send().await?;
        decode(resp).await
    }

    /// Select a scope and return the re-merged graph
    pub async fn set_scope(&self, scope: ScopeSelection) -> Result<RenderableGraph> {
        let resp = self
            .http
            .put(self.url("/api/scope"))
            .json(&ScopeRequest { scope })
            .send()
            .await?;
        decode(resp).await
    }

    /// Record a finished drag of `id` to `(x, y)`
    pub async fn move_node(&self, id: &str, x: f64, y: f64) -> Result<()> {
        let resp = self
            .http
            .post(self.url("/api/layout/move"))
            .json(&MoveRequest {
                id: id.to_string(),
                x,
                y,
            })
            .send()
            .await?;
        expect_empty(resp).await
    }

    /// Fetch a fresh snapshot now
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let resp = self.http.post(self.url("/api/refresh")).send().await?;
        decode(resp).await
    }

    pub async fn events(&self) -> Result<Vec<EventRecord>> {
        let resp = self.http.get(self.url("/api/events")).send().await?;
        decode(resp).await
    }

    pub async fn clear_events(&self) -> Result<()> {
        let resp = self.http.delete(self.url("/api/events")).send().await?;
        expect_empty(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = check(resp).await?;
    resp.json::<T>().await.context("unexpected response from daemon")
}

async fn expect_empty(resp: Response) -> Result<()> {
    check(resp).await?;
    Ok(())
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(anyhow!(error_message(status, &body)))
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => err.error,
        Err(_) if !body.trim().is_empty() => format!("{}: {}", status, body.trim()),
        Err(_) => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode as AxumStatus,
        routing::{get, post, put},
        Json, Router,
    };

    async fn spawn(router: Router) -> DaemonClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        DaemonClient::new(&format!("http://{}/", addr)).unwrap()
    }

    #[test]
    fn test_error_message_prefers_error_body() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"Unknown node: ghost"}"#),
            "Unknown node: ghost"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "502 Bad Gateway: upstream down"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_set_scope_and_move() {
        let router = Router::new()
            .route(
                "/api/scope",
                put(|Json(req): Json<ScopeRequest>| async move {
                    assert_eq!(req.scope, ScopeSelection::client("A"));
                    Json(RenderableGraph::default())
                }),
            )
            .route(
                "/api/layout/move",
                post(|Json(req): Json<MoveRequest>| async move {
                    if req.id == "n1" {
                        AxumStatus::NO_CONTENT
                    } else {
                        AxumStatus::BAD_REQUEST
                    }
                }),
            );
        let client = spawn(router).await;

        let graph = client.set_scope(ScopeSelection::client("A")).await.unwrap();
        assert!(graph.is_empty());
        client.move_node("n1", 1.0, 2.0).await.unwrap();
        assert!(client.move_node("n2", 1.0, 2.0).await.is_err());
    }

    #[tokio::test]
    async fn test_error_body_surfaces_in_result() {
        let router = Router::new().route(
            "/api/refresh",
            post(|| async {
                (
                    AxumStatus::BAD_GATEWAY,
                    Json(ErrorBody {
                        error: "controller unreachable".to_string(),
                    }),
                )
            }),
        );
        let client = spawn(router).await;

        let err = client.refresh().await.unwrap_err();
        assert_eq!(err.to_string(), "controller unreachable");
    }

    #[tokio::test]
    async fn test_health_check() {
        let client = spawn(Router::new().route("/health", get(|| async { "ok" }))).await;
        assert!(client.health_check().await);
        assert!(!client.base_url().ends_with('/'));
    }
}
