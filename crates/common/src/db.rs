//! SQLite-backed layout and event log persistence

use crate::events::EventRecord;
use crate::layout::LayoutState;
use crate::store::{decode_events, decode_layout, EventStore, LayoutStore};
use crate::Result;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Layout store keeping one row per session.
///
/// A session groups the layout of one operator console; restarting the
/// daemon under the same session name restores the positions. The session's
/// recent events live in a sibling table under the same key.
#[derive(Clone)]
pub struct SqliteLayoutStore {
    conn: Arc<Mutex<Connection>>,
    session: String,
}

impl SqliteLayoutStore {
    /// Open or create the database at path
    pub fn open(path: impl AsRef<Path>, session: impl Into<String>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            session: session.into(),
        };

        store.init_schema()?;

        info!("Opened layout database at {:?} (session {})", path.as_ref(), store.session);
        Ok(store)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory(session: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            session: session.into(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS layouts (
                session TEXT PRIMARY KEY,
                layout TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                session TEXT PRIMARY KEY,
                records TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// A store sharing this connection but bound to another session
    pub fn for_session(&self, session: impl Into<String>) -> Self {
        Self {
            conn: self.conn.clone(),
            session: session.into(),
        }
    }

    /// Forget the stored layout for this session
    pub fn clear(&self) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM layouts WHERE session = ?1", params![self.session])?;
        Ok(rows > 0)
    }

    fn raw(&self) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                "SELECT layout FROM layouts WHERE session = ?1",
                params![self.session],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw)
    }

    fn raw_events(&self) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                "SELECT records FROM events WHERE session = ?1",
                params![self.session],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw)
    }

    #[cfg(test)]
    fn write_raw(&self, raw: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO layouts (session, layout, updated_at) VALUES (?1, ?2, 0)
             ON CONFLICT(session) DO UPDATE SET layout = excluded.layout",
            params![self.session, raw],
        )?;
        Ok(())
    }
}

impl LayoutStore for SqliteLayoutStore {
    fn load(&self) -> Result<LayoutState> {
        match self.raw()? {
            Some(raw) => decode_layout(&raw),
            None => Ok(LayoutState::new()),
        }
    }

    fn save(&self, layout: &LayoutState) -> Result<()> {
        let raw = serde_json::to_string(layout)?;
        let now = chrono::Utc::now().timestamp();

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO layouts (session, layout, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(session) DO UPDATE
             SET layout = excluded.layout, updated_at = excluded.updated_at",
            params![self.session, raw, now],
        )?;

        debug!("Saved layout for session {} ({} entries)", self.session, layout.len());
        Ok(())
    }
}

impl EventStore for SqliteLayoutStore {
    fn load_events(&self) -> Result<Vec<EventRecord>> {
        match self.raw_events()? {
            Some(raw) => decode_events(&raw),
            None => Ok(Vec::new()),
        }
    }

    fn save_events(&self, records: &[EventRecord]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        let now = chrono::Utc::now().timestamp();

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO events (session, records, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(session) DO UPDATE
             SET records = excluded.records, updated_at = excluded.updated_at",
            params![self.session, raw, now],
        )?;

        debug!("Saved {} events for session {}", records.len(), self.session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventJournal, PushEnvelope};
    use crate::store::load_layout_or_empty;

    #[test]
    fn test_save_and_load() {
        let store = SqliteLayoutStore::open_memory("console").unwrap();
        assert!(store.load().unwrap().is_empty());

        let mut layout = LayoutState::new();
        layout.record("n1", 10.0, 20.0).unwrap();
        layout.record("n2", -3.5, 0.25).unwrap();
        store.save(&layout).unwrap();
        assert_eq!(store.load().unwrap(), layout);

        layout.record("n1", 11.0, 21.0).unwrap();
        store.save(&layout).unwrap();
        assert_eq!(store.load().unwrap().position("n1"), Some((11.0, 21.0)));

        assert!(store.clear().unwrap());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let first = SqliteLayoutStore::open_memory("first").unwrap();
        let second = first.for_session("second");

        let mut layout = LayoutState::new();
        layout.record("n1", 1.0, 2.0).unwrap();
        first.save(&layout).unwrap();

        assert_eq!(first.load().unwrap().len(), 1);
        assert!(second.load().unwrap().is_empty());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.db");

        let mut layout = LayoutState::new();
        layout.record("n1", 7.0, 8.0).unwrap();
        SqliteLayoutStore::open(&path, "console").unwrap().save(&layout).unwrap();

        let reopened = SqliteLayoutStore::open(&path, "console").unwrap();
        assert_eq!(reopened.load().unwrap().position("n1"), Some((7.0, 8.0)));
    }

    #[test]
    fn test_corrupt_row_is_treated_as_empty() {
        let store = SqliteLayoutStore::open_memory("console").unwrap();
        store.write_raw("definitely not json").unwrap();

        assert!(store.load().is_err());
        assert!(load_layout_or_empty(&store).is_empty());
    }

    #[test]
    fn test_event_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.db");

        {
            let store = Arc::new(SqliteLayoutStore::open(&path, "console").unwrap());
            let journal = EventJournal::restore(store);
            journal.push(&PushEnvelope {
                kind: "info".to_string(),
                message: "InsertTopo: n1".to_string(),
            });
            journal.push(&PushEnvelope {
                kind: "warning".to_string(),
                message: "Link down".to_string(),
            });
        }

        let reopened = SqliteLayoutStore::open(&path, "console").unwrap();
        let records = reopened.load_events().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "Link down");

        assert!(reopened.load().unwrap().is_empty());
        assert!(reopened.for_session("other").load_events().unwrap().is_empty());
    }
}
