//! NetScope CLI - Main Entry Point
//!
//! Operator interface to a running NetScope daemon: inspect the graph,
//! switch scopes, pin node positions and read controller events.

use clap::{Parser, Subcommand};

mod client;
mod commands;
mod output;

use commands::{events, graph, layout, scope};

/// NetScope CLI - live network topology
#[derive(Parser)]
#[command(name = "netscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Daemon address
    #[arg(long, env = "NETSCOPE_DAEMON", default_value = "http://127.0.0.1:6090", global = true)]
    daemon_addr: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the rendered graph
    #[command(subcommand)]
    Graph(graph::GraphCommands),

    /// Manage the client scope
    #[command(subcommand)]
    Scope(scope::ScopeCommands),

    /// Manage node positions
    #[command(subcommand)]
    Layout(layout::LayoutCommands),

    /// Controller events
    #[command(subcommand)]
    Events(events::EventCommands),

    /// Check daemon status
    Status,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let client = client::DaemonClient::new(&cli.daemon_addr)?;
    tracing::debug!("Using daemon at {}", client.base_url());

    let result = match cli.command {
        Commands::Graph(cmd) => graph::execute(cmd, client, cli.format).await,
        Commands::Scope(cmd) => scope::execute(cmd, client, cli.format).await,
        Commands::Layout(cmd) => layout::execute(cmd, client, cli.format).await,
        Commands::Events(cmd) => events::execute(cmd, client, cli.format).await,
        Commands::Status => {
            if client.health_check().await {
                output::print_success(&format!("Daemon is running at {}", cli.daemon_addr));
                Ok(())
            } else {
                output::print_error(&format!("Daemon is not responding at {}", cli.daemon_addr));
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("NetScope CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Common library v{}", netscope_common::VERSION);
            Ok(())
        }
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
