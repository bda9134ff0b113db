//! Layout and event log persistence
//!
//! The engine only sees [`LayoutStore`] and [`EventStore`]; backing storage is
//! chosen at construction. Stores hold a single slot of each and writes are
//! last-write-wins.

use crate::events::EventRecord;
use crate::layout::LayoutState;
use crate::{Error, Result};
use parking_lot::Mutex;
use tracing::warn;

/// Durable slot for the last known node layout
pub trait LayoutStore: Send + Sync {
    /// Read the stored layout. An absent slot is an empty layout, not an error.
    fn load(&self) -> Result<LayoutState>;

    /// Replace the stored layout
    fn save(&self, layout: &LayoutState) -> Result<()>;
}

/// Durable slot for the recent push events shown to operators
pub trait EventStore: Send + Sync {
    /// Read the stored records, newest first. An absent slot is empty.
    fn load_events(&self) -> Result<Vec<EventRecord>>;

    /// Replace the stored records
    fn save_events(&self, records: &[EventRecord]) -> Result<()>;
}

/// Load a layout, treating unreadable or corrupt data as empty.
pub fn load_layout_or_empty(store: &dyn LayoutStore) -> LayoutState {
    match store.load() {
        Ok(layout) => layout,
        Err(e) => {
            warn!("Discarding stored layout: {}", e);
            LayoutState::new()
        }
    }
}

/// Decode a stored layout blob
pub(crate) fn decode_layout(raw: &str) -> Result<LayoutState> {
    serde_json::from_str(raw)
        .map_err(|e| Error::LayoutPersistence(format!("corrupt layout: {}", e)))
}

pub(crate) fn decode_events(raw: &str) -> Result<Vec<EventRecord>> {
    serde_json::from_str(raw)
        .map_err(|e| Error::EventPersistence(format!("corrupt event log: {}", e)))
}

/// In-process store; holds the serialized layout and event log like session
/// storage slots
#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
    slot: Mutex<Option<String>>,
    events: Mutex<Option<String>>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary stored blob (which may be corrupt)
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
            events: Mutex::new(None),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn load(&self) -> Result<LayoutState> {
        match self.slot.lock().as_deref() {
            Some(raw) => decode_layout(raw),
            None => Ok(LayoutState::new()),
        }
    }

    fn save(&self, layout: &LayoutState) -> Result<()> {
        let raw = serde_json::to_string(layout)?;
        *self.slot.lock() = Some(raw);
        Ok(())
    }
}

impl EventStore for MemoryLayoutStore {
    fn load_events(&self) -> Result<Vec<EventRecord>> {
        match self.events.lock().as_deref() {
            Some(raw) => decode_events(raw),
            None => Ok(Vec::new()),
        }
    }

    fn save_events(&self, records: &[EventRecord]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        *self.events.lock() = Some(raw);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_slot_is_empty() {
        let store = MemoryLayoutStore::new();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryLayoutStore::new();
        let mut layout = LayoutState::new();
        layout.record("n1", 10.0, 20.0).unwrap();
        store.save(&layout).unwrap();

        assert_eq!(store.load().unwrap(), layout);
        assert_eq!(store.raw().unwrap(), r#"[{"id":"n1","x":10.0,"y":20.0}]"#);
    }

    #[test]
    fn test_corrupt_slot_falls_back_to_empty() {
        let store = MemoryLayoutStore::with_raw("{not json");
        assert!(matches!(store.load(), Err(Error::LayoutPersistence(_))));
        assert!(load_layout_or_empty(&store).is_empty());

        let wrong_shape = MemoryLayoutStore::with_raw(r#"{"id":"n1"}"#);
        assert!(load_layout_or_empty(&wrong_shape).is_empty());
    }

    #[test]
    fn test_event_slot_is_separate_from_layout() {
        let store = MemoryLayoutStore::new();
        assert!(store.load_events().unwrap().is_empty());

        let records = vec![EventRecord {
            title: "info".to_string(),
            message: "InsertTopo: n1".to_string(),
            time_stamp: 42,
        }];
        store.save_events(&records).unwrap();

        assert_eq!(store.load_events().unwrap(), records);
        assert!(store.raw().is_none());
    }
}
