#![forbid(unsafe_code)]

use crate::domain::RoutePath;
use crate::error::Error;
use crate::external::KeyValueStore;
use crate::stores::NavigationHistory;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Fixed key under which navigation history lives in the durable store.
pub const HISTORY_KEY: &str = "route-preload:navigation-history";

/// Persisted form of one transition. Probability is derived state and is not
/// written; it is recomputed from `count` on rehydration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionSnapshot {
    pub from: String,
    pub to: String,
    pub count: u32,
}

/// Serializes the navigation history to the durable key-value store.
///
/// Writes are last-writer-wins and failures are swallowed: losing a few
/// observations degrades prediction quality, it does not break navigation.
pub struct HistoryRepository {
    store: Box<dyn KeyValueStore>,
}

impl HistoryRepository {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write the full transition set. The in-memory model stays
    /// authoritative; callers downgrade a serialization failure to a log.
    pub fn save(&self, history: &NavigationHistory) -> Result<(), Error> {
        let snapshots: Vec<TransitionSnapshot> = history
            .iter()
            .map(|record| TransitionSnapshot {
                from: record.from.as_str().to_string(),
                to: record.to.as_str().to_string(),
                count: record.count,
            })
            .collect();

        let json = serde_json::to_string(&snapshots)?;
        self.store.set_item(HISTORY_KEY, &json);
        Ok(())
    }

    /// Read the persisted transition set. Missing or malformed data yields
    /// an empty set, never an error.
    pub fn load(&self) -> Vec<(RoutePath, RoutePath, u32)> {
        let Some(json) = self.store.get_item(HISTORY_KEY) else {
            debug!("no persisted navigation history");
            return Vec::new();
        };

        match serde_json::from_str::<Vec<TransitionSnapshot>>(&json) {
            Ok(snapshots) => snapshots
                .into_iter()
                .map(|s| (RoutePath::new(s.from), RoutePath::new(s.to), s.count))
                .collect(),
            Err(err) => {
                warn!(%err, "corrupt navigation history; starting empty");
                Vec::new()
            }
        }
    }
}

/// In-memory key-value store for tests and for embedding hosts that provide
/// no durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a key, e.g. with corrupt data in degradation tests.
    pub fn with_item(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.set_item(key, value);
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items.lock().insert(key.to_string(), value.to_string());
    }
}
