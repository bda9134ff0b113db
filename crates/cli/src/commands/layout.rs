//! Layout Commands

use anyhow::{bail, Result};
use clap::Subcommand;

use crate::client::DaemonClient;
use crate::output::{print_message, print_success, OutputFormat};

#[derive(Subcommand)]
pub enum LayoutCommands {
    /// Pin a node at a position, as if dragged there
    Move {
        /// Node id
        id: String,

        /// Horizontal position
        #[arg(allow_negative_numbers = true)]
        x: f64,

        /// Vertical position
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
}

pub async fn execute(
    cmd: LayoutCommands,
    client: DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        LayoutCommands::Move { id, x, y } => {
            if !x.is_finite() || !y.is_finite() {
                bail!("position ({}, {}) is not finite", x, y);
            }
            client.move_node(&id, x, y).await?;
            match format {
                OutputFormat::Json => print_message(&format!("moved {}", id), format),
                _ => print_success(&format!("Node '{}' moved to ({}, {})", id, x, y)),
            }
        }
    }

    Ok(())
}
