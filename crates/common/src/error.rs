//! Error types for NetScope

use thiserror::Error;

/// Result type alias using NetScope Error
pub type Result<T> = std::result::Result<T, Error>;

/// NetScope error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot refresh failed; carries the human-readable reason.
    #[error("Topology fetch failed: {0}")]
    Fetch(String),

    #[error("Malformed topology snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Layout persistence error: {0}")]
    LayoutPersistence(String),

    #[error("Event log persistence error: {0}")]
    EventPersistence(String),

    #[error("Unknown client scope: {0}")]
    UnknownScope(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Invalid position for node {id}: ({x}, {y})")]
    InvalidPosition { id: String, x: f64, y: f64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors caused by the caller's request rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownScope(_) | Error::UnknownNode(_) | Error::InvalidPosition { .. }
        )
    }
}
