//! NetScope Common Library
//!
//! Topology model and the reconciliation engine shared by the NetScope
//! daemon and CLI: snapshot ingress, graph merging, layout continuity,
//! layout and event persistence and the controller that ties them together.

pub mod api;
pub mod controller;
pub mod db;
pub mod error;
pub mod events;
pub mod layout;
pub mod merge;
pub mod snapshot;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use api::{ErrorBody, GraphResponse, MoveRequest, ScopeRequest, ScopesResponse};
pub use controller::{RefreshOutcome, TopologyController, TopologySource};
pub use db::SqliteLayoutStore;
pub use error::{Error, Result};
pub use events::{EventJournal, EventLog, EventRecord, PushEnvelope};
pub use layout::{apply_layout, LayoutEntry, LayoutState};
pub use merge::{merge, EmptyIdPolicy, ImageCatalog, MergeOptions};
pub use snapshot::{IngressReport, RawTopologySnapshot};
pub use store::{load_layout_or_empty, EventStore, LayoutStore, MemoryLayoutStore};
pub use types::*;

/// NetScope version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store path
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".netscope")
}

/// Default layout database path
pub fn default_db_path() -> std::path::PathBuf {
    default_store_path().join("layout.db")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
