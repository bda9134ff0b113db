//! HTTP surface for the renderer and operators
//!
//! The renderer polls `/api/graph` and reports drag ends to
//! `/api/layout/move`; the scope selector and manual refresh live alongside.

use crate::push::SharedEventLog;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use netscope_common::{
    Error, ErrorBody, EventRecord, GraphResponse, MoveRequest, RefreshOutcome, RenderableGraph,
    ScopeRequest, ScopesResponse, TopologyController,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<TopologyController>,
    pub events: SharedEventLog,
    pub render_config: Arc<serde_json::Value>,
}

/// Library errors rendered as JSON responses
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            Error::Fetch(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self.0 {
            Error::Fetch(msg) => msg,
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/graph", get(graph_handler))
        .route("/api/scopes", get(scopes_handler))
        .route("/api/scope", put(set_scope_handler))
        .route("/api/layout/move", post(move_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/events", get(events_handler).delete(clear_events_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP surface listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn graph_handler(State(state): State<AppState>) -> Json<GraphResponse> {
    Json(GraphResponse {
        scope: state.controller.scope(),
        graph: state.controller.graph(),
        config: state.render_config.as_ref().clone(),
        last_error: state.controller.last_error(),
    })
}

async fn scopes_handler(State(state): State<AppState>) -> Json<ScopesResponse> {
    Json(ScopesResponse {
        current: state.controller.scope(),
        options: state.controller.scope_options(),
    })
}

async fn set_scope_handler(
    State(state): State<AppState>,
    Json(req): Json<ScopeRequest>,
) -> Result<Json<RenderableGraph>, ApiError> {
    let graph = state.controller.set_scope(req.scope)?;
    Ok(Json(graph))
}

async fn move_handler(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<StatusCode, ApiError> {
    state.controller.record_move(&req.id, req.x, req.y)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn refresh_handler(State(state): State<AppState>) -> Result<Json<RefreshOutcome>, ApiError> {
    let outcome = state.controller.refresh().await?;
    Ok(Json(outcome))
}

async fn events_handler(State(state): State<AppState>) -> Json<Vec<EventRecord>> {
    Json(state.events.records())
}

async fn clear_events_handler(State(state): State<AppState>) -> StatusCode {
    state.events.clear();
    StatusCode::NO_CONTENT
}
