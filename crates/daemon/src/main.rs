//! NetScope Daemon
//!
//! Keeps a live, layout-stable topology graph in sync with the
//! network-management controller and serves it to the renderer.

use clap::Parser;
use netscope_common::{
    EventJournal, EventStore, LayoutStore, MemoryLayoutStore, SqliteLayoutStore, TopologyController,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod client;
mod config;
mod push;
mod refresher;
mod server;

use config::DaemonConfig;
use refresher::{RefreshHandle, RefreshTrigger, Refresher};

#[derive(Parser)]
#[command(name = "netscoped")]
#[command(about = "NetScope daemon - live network topology for the console")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "NETSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Controller base URL
    #[arg(long, env = "NETSCOPE_CONTROLLER_URL")]
    controller: Option<String>,

    /// Controller bearer token
    #[arg(long, env = "NETSCOPE_CONTROLLER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// HTTP listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Layout session name
    #[arg(long)]
    session: Option<String>,

    /// Do not subscribe to the controller event stream
    #[arg(long)]
    no_push: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if cli.json_logs {
        tracing_subscriber::registry().with(fmt::layer().json()).with(filter).init();
    } else {
        tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
    }

    info!("NetScope daemon v{}", netscope_common::VERSION);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| netscope_common::default_store_path().join("config.toml"));
    let mut config = DaemonConfig::load(&config_path)?;
    if let Some(url) = cli.controller {
        config.controller.base_url = url;
    }
    if let Some(token) = cli.token {
        config.controller.token = Some(token);
    }
    if let Some(listen) = cli.listen {
        config.http.listen = listen;
    }
    if let Some(session) = cli.session {
        config.layout.session = session;
    }
    if cli.no_push {
        config.controller.enable_push = false;
    }

    // Layout and event log share one backing store per session
    let (layout_store, event_store): (Arc<dyn LayoutStore>, Arc<dyn EventStore>) =
        if config.layout.ephemeral {
            let store = Arc::new(MemoryLayoutStore::new());
            (store.clone() as Arc<dyn LayoutStore>, store as Arc<dyn EventStore>)
        } else {
            let db_path = config.db_path();
            if let Some(parent) = db_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let store = Arc::new(SqliteLayoutStore::open(&db_path, config.layout.session.clone())?);
            (store.clone() as Arc<dyn LayoutStore>, store as Arc<dyn EventStore>)
        };

    let source = Arc::new(client::HttpTopologySource::new(&config.controller)?);
    info!("Reading topology from {}", source.url());

    let controller = Arc::new(TopologyController::new(source, layout_store, config.merge.clone()));
    let events = Arc::new(EventJournal::restore(event_store));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Refresh loop, primed with the initial load
    let (refresh, refresh_rx) = RefreshHandle::channel();
    let refresher_handle = tokio::spawn(Refresher::new(controller.clone(), refresh_rx).run());
    refresh.trigger(RefreshTrigger::Startup);

    let push_handle = if config.controller.enable_push {
        let listener = push::PushListener::new(
            config.controller.push_url(),
            config.controller.token.clone(),
            Duration::from_secs(config.controller.reconnect_delay_secs),
            events.clone(),
            refresh.clone(),
        );
        Some(tokio::spawn(listener.run(shutdown_rx.clone())))
    } else {
        info!("Push notifications disabled");
        None
    };

    let addr: SocketAddr = config.http.listen.parse()?;
    let state = server::AppState {
        controller: controller.clone(),
        events,
        render_config: Arc::new(config.render.clone()),
    };
    let mut server_shutdown = shutdown_rx.clone();
    let mut server_handle = tokio::spawn(server::serve(addr, state, async move {
        let _ = server_shutdown.changed().await;
    }));

    // Wait for shutdown signal
    let server_result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            None
        }
        result = &mut server_handle => Some(result),
    };

    controller.shutdown();
    let _ = shutdown_tx.send(true);
    drop(refresh);

    if let Some(handle) = push_handle {
        let _ = handle.await;
    }
    let server_result = match server_result {
        Some(result) => result,
        None => server_handle.await,
    };
    match server_result {
        Ok(Err(e)) => tracing::error!("HTTP server error: {}", e),
        Err(e) => tracing::error!("HTTP server task failed: {}", e),
        Ok(Ok(())) => {}
    }
    let _ = refresher_handle.await;

    info!("Daemon shutdown complete");
    Ok(())
}
