//! Scope Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::client::DaemonClient;
use crate::output::{print_list, print_success, print_value, OutputFormat, TableDisplay};
use netscope_common::{ScopeSelection, ScopesResponse};

#[derive(Subcommand)]
pub enum ScopeCommands {
    /// List selectable scopes
    List,

    /// Show the current scope
    Get,

    /// Select a client, or `all_clients` for everything
    Set {
        /// Client id or `all_clients`
        scope: String,
    },
}

/// Scope display wrapper for serialization
#[derive(Serialize)]
pub struct ScopeDisplay {
    pub scope: String,
    pub current: bool,
}

impl TableDisplay for ScopeDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Scope", "Current"]
    }

    fn row(&self) -> Vec<String> {
        let marker = if self.current { "*" } else { "" };
        vec![self.scope.clone(), marker.to_string()]
    }
}

pub fn scope_rows(resp: &ScopesResponse) -> Vec<ScopeDisplay> {
    resp.options
        .iter()
        .map(|option| ScopeDisplay {
            scope: option.to_string(),
            current: *option == resp.current,
        })
        .collect()
}

pub async fn execute(cmd: ScopeCommands, client: DaemonClient, format: OutputFormat) -> Result<()> {
    match cmd {
        ScopeCommands::List => {
            let resp = client.scopes().await?;
            print_list(&scope_rows(&resp), format);
        }

        ScopeCommands::Get => {
            let resp = client.scopes().await?;
            match format {
                OutputFormat::Json | OutputFormat::Yaml => print_value(&resp.current, format),
                _ => println!("{}", resp.current),
            }
        }

        ScopeCommands::Set { scope } => {
            let scope = ScopeSelection::from(scope);
            let graph = client.set_scope(scope.clone()).await?;
            match format {
                OutputFormat::Json | OutputFormat::Yaml => print_value(&graph, format),
                _ => print_success(&format!(
                    "Scope set to '{}' ({} nodes, {} links)",
                    scope,
                    graph.nodes.len(),
                    graph.links.len()
                )),
            }
        }
    }

    Ok(())
}
