//! Event Commands

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::Subcommand;
use serde::Serialize;

use crate::client::DaemonClient;
use crate::output::{print_list, print_success, OutputFormat, TableDisplay};
use netscope_common::EventRecord;

#[derive(Subcommand)]
pub enum EventCommands {
    /// List recent controller events, newest first
    List,

    /// Clear the event log
    Clear,
}

/// Event display wrapper for serialization
#[derive(Serialize)]
pub struct EventDisplay {
    pub time: String,
    pub title: String,
    pub message: String,
}

impl From<EventRecord> for EventDisplay {
    fn from(record: EventRecord) -> Self {
        let time = Local
            .timestamp_millis_opt(record.time_stamp)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| record.time_stamp.to_string());
        Self {
            time,
            title: record.title,
            message: record.message,
        }
    }
}

impl TableDisplay for EventDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Time", "Type", "Message"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.time.clone(), self.title.clone(), self.message.clone()]
    }
}

pub async fn execute(cmd: EventCommands, client: DaemonClient, format: OutputFormat) -> Result<()> {
    match cmd {
        EventCommands::List => {
            let records = client.events().await?;
            let displays: Vec<EventDisplay> = records.into_iter().map(EventDisplay::from).collect();
            print_list(&displays, format);
        }

        EventCommands::Clear => {
            client.clear_events().await?;
            print_success("Event log cleared");
        }
    }

    Ok(())
}
