//! Graph Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::client::DaemonClient;
use crate::output::{
    print_list, print_message, print_success, print_value, print_warning, OutputFormat,
    TableDisplay,
};
use netscope_common::{RefreshOutcome, RenderLink, RenderNode};

#[derive(Subcommand)]
pub enum GraphCommands {
    /// Summarize the current graph
    Show,

    /// List nodes with their positions
    Nodes,

    /// List links
    Links,

    /// Dump the graph exactly as the renderer receives it
    Export,

    /// Fetch a fresh snapshot from the controller now
    Refresh,
}

/// Node display wrapper for serialization
#[derive(Serialize)]
pub struct NodeDisplay {
    pub id: String,
    pub model: String,
    pub ip_address: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl From<&RenderNode> for NodeDisplay {
    fn from(node: &RenderNode) -> Self {
        Self {
            id: node.node.id.clone(),
            model: node.node.model.clone(),
            ip_address: node.node.ip_address.clone(),
            x: node.x,
            y: node.y,
        }
    }
}

impl TableDisplay for NodeDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Model", "IP", "Position"]
    }

    fn row(&self) -> Vec<String> {
        let position = match (self.x, self.y) {
            (Some(x), Some(y)) => format!("({:.1}, {:.1})", x, y),
            _ => "-".to_string(),
        };
        vec![self.id.clone(), self.model.clone(), self.ip_address.clone(), position]
    }
}

/// Link display wrapper for serialization
#[derive(Serialize)]
pub struct LinkDisplay {
    pub edge: String,
    pub source: String,
    pub target: String,
    pub ports: String,
    pub blocked: bool,
}

impl From<&RenderLink> for LinkDisplay {
    fn from(link: &RenderLink) -> Self {
        let raw = &link.link;
        Self {
            edge: raw.edge_data.clone(),
            source: raw.source.clone(),
            target: raw.target.clone(),
            ports: format!("{} <-> {}", raw.source_port, raw.target_port),
            blocked: raw.blocked_port,
        }
    }
}

impl TableDisplay for LinkDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Edge", "Source", "Target", "Ports", "Blocked"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.edge.clone(),
            self.source.clone(),
            self.target.clone(),
            self.ports.clone(),
            self.blocked.to_string(),
        ]
    }
}

/// One-line description of a refresh result
pub fn describe_outcome(outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Applied {
            sequence,
            clients,
            nodes,
            links,
            scope_reset,
        } => {
            let mut msg = format!(
                "Refresh #{} applied: {} clients, {} nodes, {} links",
                sequence, clients, nodes, links
            );
            if *scope_reset {
                msg.push_str(" (selected client vanished, scope reset to all clients)");
            }
            msg
        }
        RefreshOutcome::Stale { sequence, latest } => {
            format!("Refresh #{} was superseded by #{}", sequence, latest)
        }
        RefreshOutcome::Discarded { sequence } => {
            format!("Refresh #{} discarded, daemon is shutting down", sequence)
        }
    }
}

pub async fn execute(cmd: GraphCommands, client: DaemonClient, format: OutputFormat) -> Result<()> {
    match cmd {
        GraphCommands::Show => {
            let resp = client.graph().await?;
            match format {
                OutputFormat::Json | OutputFormat::Yaml => print_value(&resp, format),
                _ => {
                    let positioned =
                        resp.graph.nodes.iter().filter(|n| n.position().is_some()).count();
                    let blocked = resp.graph.links.iter().filter(|l| l.color.is_some()).count();
                    println!("Scope:   {}", resp.scope);
                    println!("Nodes:   {} ({} positioned)", resp.graph.nodes.len(), positioned);
                    println!("Links:   {} ({} blocked)", resp.graph.links.len(), blocked);
                    if let Some(err) = resp.last_error {
                        print_warning(&format!("Last refresh failed: {}", err));
                    }
                }
            }
        }

        GraphCommands::Nodes => {
            let resp = client.graph().await?;
            let displays: Vec<NodeDisplay> =
                resp.graph.nodes.iter().map(NodeDisplay::from).collect();
            print_list(&displays, format);
        }

        GraphCommands::Links => {
            let resp = client.graph().await?;
            let displays: Vec<LinkDisplay> =
                resp.graph.links.iter().map(LinkDisplay::from).collect();
            print_list(&displays, format);
        }

        GraphCommands::Export => {
            let resp = client.graph().await?;
            print_value(&resp.graph, format);
        }

        GraphCommands::Refresh => {
            let outcome = client.refresh().await?;
            match format {
                OutputFormat::Json | OutputFormat::Yaml => print_value(&outcome, format),
                _ => match outcome {
                    RefreshOutcome::Applied { .. } => print_success(&describe_outcome(&outcome)),
                    _ => print_message(&describe_outcome(&outcome), format),
                },
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netscope_common::{RawLink, RawNode};

    #[test]
    fn test_node_row_shows_position_or_dash() {
        let mut node = RenderNode {
            node: RawNode::new("n1").with_model("EHG7512").with_ip("10.0.0.1"),
            x: None,
            y: None,
            svg: String::new(),
        };
        assert_eq!(NodeDisplay::from(&node).row()[3], "-");

        node.x = Some(10.0);
        node.y = Some(2.5);
        assert_eq!(
            NodeDisplay::from(&node).row(),
            vec!["n1", "EHG7512", "10.0.0.1", "(10.0, 2.5)"]
        );
    }

    #[test]
    fn test_link_row() {
        let link = RenderLink {
            link: RawLink::between("b", "a").with_ports("1", "2").blocked(true),
            color: Some("orange".to_string()),
        };
        assert_eq!(LinkDisplay::from(&link).row(), vec!["a_b", "b", "a", "1 <-> 2", "true"]);
    }

    #[test]
    fn test_describe_outcome() {
        let applied = RefreshOutcome::Applied {
            sequence: 4,
            clients: 2,
            nodes: 7,
            links: 5,
            scope_reset: true,
        };
        let text = describe_outcome(&applied);
        assert!(text.starts_with("Refresh #4 applied: 2 clients, 7 nodes, 5 links"));
        assert!(text.contains("scope reset"));

        let stale = RefreshOutcome::Stale { sequence: 3, latest: 4 };
        assert_eq!(describe_outcome(&stale), "Refresh #3 was superseded by #4");
    }
}
