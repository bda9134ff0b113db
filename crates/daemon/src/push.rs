//! Controller event stream listener
//!
//! Reads `{kind, message}` envelopes from the controller's WebSocket, keeps
//! the recent ones for operators and turns topology-change notifications into
//! refresh triggers. The connection is re-established after any error.

use crate::refresher::{RefreshHandle, RefreshTrigger};
use futures::StreamExt;
use netscope_common::{EventJournal, PushEnvelope};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Shared log of recent push events
pub type SharedEventLog = Arc<EventJournal>;

/// Listens to the controller event stream
pub struct PushListener {
    url: String,
    token: Option<String>,
    reconnect_delay: Duration,
    events: SharedEventLog,
    refresh: RefreshHandle,
}

impl PushListener {
    pub fn new(
        url: String,
        token: Option<String>,
        reconnect_delay: Duration,
        events: SharedEventLog,
        refresh: RefreshHandle,
    ) -> Self {
        Self {
            url,
            token,
            reconnect_delay,
            events,
            refresh,
        }
    }

    /// Run until `shutdown` flips to true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Push listener started for {}", self.url);

        loop {
            tokio::select! {
                result = self.listen_once() => {
                    match result {
                        Ok(()) => info!("Event stream closed by controller"),
                        Err(e) => warn!("Event stream error: {}", e),
                    }
                }
                _ = shutdown.changed() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = shutdown.changed() => break,
            }
            debug!("Reconnecting to {}", self.url);
        }

        info!("Push listener stopped");
    }

    async fn listen_once(&self) -> anyhow::Result<()> {
        let mut request = self.url.as_str().into_client_request()?;
        if let Some(token) = &self.token {
            request
                .headers_mut()
                .insert("Authorization", HeaderValue::from_str(&format!("Bearer {}", token))?);
        }

        let (mut stream, _) = tokio_tungstenite::connect_async(request).await?;
        info!("Connected to event stream {}", self.url);

        while let Some(frame) = stream.next().await {
            match frame? {
                Message::Text(text) => {
                    self.handle_text(&text);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        Ok(())
    }

    /// Record one text frame and trigger a refresh for topology changes.
    ///
    /// Returns whether a refresh was requested.
    pub fn handle_text(&self, text: &str) -> bool {
        let envelope = match PushEnvelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Ignoring non-envelope frame: {}", e);
                return false;
            }
        };

        self.events.push(&envelope);

        if envelope.is_topology_change() {
            debug!("Topology change notified: {}", envelope.message);
            self.refresh.trigger(RefreshTrigger::Push);
            true
        } else {
            false
        }
    }
}
