use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::place::Place;

/// Error type surfaced by host persistence. Never propagated into the tracker.
pub type PersistenceError = Box<dyn std::error::Error + Send + Sync>;

/// An item observed at a place. Immutable once appended to history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemEvent {
    pub item_name: String,
    pub place_name: String,
    pub coordinate: Coordinate,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl ItemEvent {
    pub fn new(item_name: &str, place_name: &str, coordinate: Coordinate, timestamp: i64) -> Self {
        Self {
            item_name: item_name.to_string(),
            place_name: place_name.to_string(),
            coordinate,
            timestamp,
        }
    }

    pub fn at_place(item_name: &str, place: &Place, timestamp: i64) -> Self {
        Self::new(item_name, &place.name, place.center, timestamp)
    }
}

/// Host-supplied storage for the event log.
pub trait HistoryPersistence {
    fn load(&mut self) -> Result<Vec<ItemEvent>, PersistenceError>;

    /// Persist the full log. Called after every history mutation.
    fn save(&mut self, events: &[ItemEvent]) -> Result<(), PersistenceError>;
}

/// Keeps the "persisted" log in memory. Useful for tests and ephemeral hosts.
#[derive(Clone, Debug, Default)]
pub struct MemoryPersistence {
    pub events: Vec<ItemEvent>,
    pub saves: usize,
    pub fail: bool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<ItemEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// A backend whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl HistoryPersistence for MemoryPersistence {
    fn load(&mut self) -> Result<Vec<ItemEvent>, PersistenceError> {
        if self.fail {
            return Err("memory persistence unavailable".into());
        }
        Ok(self.events.clone())
    }

    fn save(&mut self, events: &[ItemEvent]) -> Result<(), PersistenceError> {
        if self.fail {
            return Err("memory persistence unavailable".into());
        }
        self.events = events.to_vec();
        self.saves += 1;
        Ok(())
    }
}

/// Append-only event log in chronological order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventHistory {
    events: Vec<ItemEvent>,
}

impl EventHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from persisted or imported events, clamping any
    /// out-of-order timestamps the same way `append` does.
    pub fn from_events(events: Vec<ItemEvent>) -> Self {
        let mut history = Self::new();
        history.append_all(events);
        history
    }

    /// Consume the log, returning its events.
    pub fn into_events(self) -> Vec<ItemEvent> {
        self.events
    }

    /// Append one event. A timestamp older than the log's tail is raised to
    /// the tail so the log stays non-decreasing.
    pub fn append(&mut self, mut event: ItemEvent) {
        if let Some(last) = self.last_timestamp()
            && event.timestamp < last
        {
            tracing::debug!(
                "clamping out-of-order event for '{}' from {} to {last}",
                event.item_name,
                event.timestamp
            );
            event.timestamp = last;
        }
        self.events.push(event);
    }

    pub fn append_all(&mut self, events: impl IntoIterator<Item = ItemEvent>) {
        for event in events {
            self.append(event);
        }
    }

    pub fn all(&self) -> &[ItemEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.events.last().map(|e| e.timestamp)
    }

    pub fn for_item<'a>(&'a self, item_name: &'a str) -> impl Iterator<Item = &'a ItemEvent> {
        self.events.iter().filter(move |e| e.item_name == item_name)
    }
}
