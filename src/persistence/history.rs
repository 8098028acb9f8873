//! Local run history
//!
//! Newest-first list of completed runs, capped, stored per user.

use serde::{Deserialize, Serialize};

use super::{KeyValueStore, StoreError, load_json, save_json};
use crate::consts::MAX_HISTORY_ENTRIES;
use crate::sim::{Identity, ScoreEntry};

/// Run history for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunHistory {
    pub entries: Vec<ScoreEntry>,
}

impl RunHistory {
    const KEY_PREFIX: &'static str = "chihuahua_run_history";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage_key(identity: &Identity) -> String {
        format!("{}_{}", Self::KEY_PREFIX, identity.storage_key())
    }

    /// Prepend a run, dropping the oldest past the cap
    pub fn record(&mut self, entry: ScoreEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY_ENTRIES);
    }

    pub fn best(&self) -> Option<&ScoreEntry> {
        self.entries.iter().max_by_key(|e| e.score)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a user's history; unreadable history starts fresh
    pub fn load(store: &dyn KeyValueStore, identity: &Identity) -> Self {
        match load_json::<RunHistory>(store, &Self::storage_key(identity)) {
            Ok(Some(history)) => {
                log::info!("Loaded {} runs of history", history.entries.len());
                history
            }
            Ok(None) => Self::new(),
            Err(e) => {
                log::warn!("Run history unreadable, starting fresh: {}", e);
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, identity: &Identity) -> Result<(), StoreError> {
        save_json(store, &Self::storage_key(identity), self)
    }
}
