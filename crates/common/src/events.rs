//! Push notifications from the controller event stream

use crate::store::EventStore;
use crate::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

/// Marker the controller puts in messages about inserted/removed topology
pub const TOPOLOGY_CHANGE_MARKER: &str = "InsertTopo:";

/// Number of recent events kept for the operator
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 10;

/// Envelope of every push message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEnvelope {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

impl PushEnvelope {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Whether this event should refetch the topology snapshot
    pub fn is_topology_change(&self) -> bool {
        self.message.contains(TOPOLOGY_CHANGE_MARKER)
    }
}

/// A received event as shown to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub time_stamp: i64,
}

/// Most recent push events, newest first
#[derive(Debug, Clone)]
pub struct EventLog {
    records: VecDeque<EventRecord>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

impl EventLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a log from stored records, newest first
    pub fn from_records(records: Vec<EventRecord>, capacity: usize) -> Self {
        let mut log = Self::with_capacity(capacity);
        log.records.extend(records);
        log.records.truncate(capacity.max(1));
        log
    }

    pub fn push(&mut self, envelope: &PushEnvelope) -> &EventRecord {
        self.push_at(envelope, chrono::Utc::now().timestamp_millis())
    }

    pub fn push_at(&mut self, envelope: &PushEnvelope, time_stamp: i64) -> &EventRecord {
        self.records.push_front(EventRecord {
            title: envelope.kind.clone(),
            message: envelope.message.clone(),
            time_stamp,
        });
        self.records.truncate(self.capacity.max(1));
        &self.records[0]
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Event log shared between the push listener and the HTTP surface, written
/// through to an [`EventStore`] when one is attached
pub struct EventJournal {
    log: Mutex<EventLog>,
    store: Option<Arc<dyn EventStore>>,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl EventJournal {
    pub fn in_memory() -> Self {
        Self {
            log: Mutex::new(EventLog::default()),
            store: None,
        }
    }

    /// Start from the records in `store`; unreadable data starts an empty log.
    pub fn restore(store: Arc<dyn EventStore>) -> Self {
        let records = match store.load_events() {
            Ok(records) => records,
            Err(e) => {
                warn!("Discarding stored event log: {}", e);
                Vec::new()
            }
        };
        Self {
            log: Mutex::new(EventLog::from_records(records, DEFAULT_EVENT_LOG_CAPACITY)),
            store: Some(store),
        }
    }

    pub fn push(&self, envelope: &PushEnvelope) -> EventRecord {
        let mut log = self.log.lock();
        let record = log.push(envelope).clone();
        self.persist(&log);
        record
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.log.lock().records()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    pub fn clear(&self) {
        let mut log = self.log.lock();
        log.clear();
        self.persist(&log);
    }

    fn persist(&self, log: &EventLog) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save_events(&log.records()) {
                warn!("Failed to persist event log: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLayoutStore;

    #[test]
    fn test_topology_change_detection() {
        let text = r#"{"kind":"info","message":"InsertTopo: 00:60:e9:aa:bb:cc port3"}"#;
        let insert = PushEnvelope::parse(text).unwrap();
        assert!(insert.is_topology_change());

        let arp = PushEnvelope::parse(r#"{"kind":"info","message":"ArpCheck: 10.0.0.9"}"#).unwrap();
        assert!(!arp.is_topology_change());

        let bare = PushEnvelope::parse(r#"{"kind":"syslog"}"#).unwrap();
        assert!(!bare.is_topology_change());

        assert!(PushEnvelope::parse("InsertTopo: raw").is_err());
    }

    #[test]
    fn test_event_log_keeps_newest_first_and_caps() {
        let mut log = EventLog::default();
        for i in 0..15 {
            let envelope = PushEnvelope {
                kind: "info".to_string(),
                message: format!("event {}", i),
            };
            log.push_at(&envelope, i);
        }

        assert_eq!(log.len(), DEFAULT_EVENT_LOG_CAPACITY);
        let records = log.records();
        assert_eq!(records[0].message, "event 14");
        assert_eq!(records[9].message, "event 5");

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_journal_restores_and_writes_through() {
        let store = Arc::new(MemoryLayoutStore::new());
        let stored: Vec<EventRecord> = (0..12)
            .map(|i| EventRecord {
                title: "info".to_string(),
                message: format!("old {}", i),
                time_stamp: 100 - i,
            })
            .collect();
        store.save_events(&stored).unwrap();

        let journal = EventJournal::restore(store.clone());
        assert_eq!(journal.len(), DEFAULT_EVENT_LOG_CAPACITY);
        assert_eq!(journal.records()[0].message, "old 0");

        journal.push(&PushEnvelope {
            kind: "info".to_string(),
            message: "InsertTopo: n2".to_string(),
        });
        let saved = store.load_events().unwrap();
        assert_eq!(saved.len(), DEFAULT_EVENT_LOG_CAPACITY);
        assert_eq!(saved[0].message, "InsertTopo: n2");
        assert_eq!(saved[1].message, "old 0");

        journal.clear();
        assert!(journal.is_empty());
        assert!(store.load_events().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_stored_events_start_empty() {
        struct Corrupt;

        impl EventStore for Corrupt {
            fn load_events(&self) -> Result<Vec<EventRecord>> {
                crate::store::decode_events("{oops")
            }

            fn save_events(&self, _records: &[EventRecord]) -> Result<()> {
                Ok(())
            }
        }

        let journal = EventJournal::restore(Arc::new(Corrupt));
        assert!(journal.is_empty());
    }
}
