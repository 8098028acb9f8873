//! Item inventory
//!
//! Quantities per item kind. The simulation never touches this directly: it
//! emits grants as events and only applies an item after the session has
//! consumed it here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError, load_json, save_json};
use crate::sim::Identity;

/// Item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Heals one life
    Treat,
    /// Absorbs the life loss of the next hit
    Shield,
}

/// Item quantities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<ItemKind, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quantity(&self, kind: ItemKind) -> u32 {
        self.items.get(&kind).copied().unwrap_or(0)
    }

    pub fn grant(&mut self, kind: ItemKind, quantity: u32) {
        let entry = self.items.entry(kind).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Take one item. Returns false if none are left.
    pub fn consume(&mut self, kind: ItemKind) -> bool {
        match self.items.get_mut(&kind) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.values().all(|&q| q == 0)
    }

    pub fn storage_key(identity: &Identity) -> String {
        format!("chihuahua_run_inventory_{}", identity.storage_key())
    }

    /// Load a user's items; unreadable data starts empty
    pub fn load(store: &dyn KeyValueStore, identity: &Identity) -> Self {
        load_json(store, &Self::storage_key(identity))
            .unwrap_or_else(|e| {
                log::warn!("Inventory unreadable, starting empty: {}", e);
                None
            })
            .unwrap_or_default()
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, identity: &Identity) -> Result<(), StoreError> {
        save_json(store, &Self::storage_key(identity), self)
    }
}
