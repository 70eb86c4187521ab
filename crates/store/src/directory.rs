use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::{
    backend::{StoreBackend, Table},
    error::Result,
};

/// One keyed, persisted mapping (avatar catalog, server directory, …).
///
/// Entry values are opaque JSON; the orchestration core never interprets
/// them. Every mutation flushes the full table to the backend while the
/// write lock is held, so mutations to the same store serialise. The flush
/// itself is a full-table overwrite: last writer wins at the backend level.
/// The lock is never held across an `.await`.
pub struct Directory {
    key: String,
    backend: Arc<dyn StoreBackend>,
    entries: RwLock<Table>,
}

impl Directory {
    /// Load a store from the backend. Missing stores start empty.
    pub fn load(key: impl Into<String>, backend: Arc<dyn StoreBackend>) -> Result<Self> {
        let key = key.into();
        let entries = backend.load(&key)?;
        Ok(Self {
            key,
            backend,
            entries: RwLock::new(entries),
        })
    }

    /// Logical store name this directory is persisted under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(id)
    }

    /// Insert or replace an entry, then flush.
    pub fn insert(&self, id: impl Into<String>, value: Value) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(id.into(), value);
        self.backend.save(&self.key, &entries)
    }

    /// Remove an entry, then flush. Returns the removed value, if any.
    pub fn remove(&self, id: &str) -> Result<Option<Value>> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let removed = entries.remove(id);
        if removed.is_some() {
            self.backend.save(&self.key, &entries)?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the full table, for listing commands.
    pub fn snapshot(&self) -> Table {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.clone()
    }

    /// Entry ids in unspecified order.
    pub fn ids(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.keys().cloned().collect()
    }
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("key", &self.key)
            .field("entries", &self.len())
            .finish()
    }
}
