use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::error::Result;

/// One store's full contents: entry id → opaque JSON value.
pub type Table = HashMap<String, serde_json::Value>;

/// Durable storage for keyed mappings, addressed by logical store name.
///
/// Calls are synchronous; callers flush after every mutation, so a backend
/// is expected to complete quickly (a local file write, not a network hop).
pub trait StoreBackend: Send + Sync {
    /// Load a store's contents. A store that was never saved loads empty.
    fn load(&self, key: &str) -> Result<Table>;

    /// Persist a store's full contents, replacing whatever was there.
    fn save(&self, key: &str, entries: &Table) -> Result<()>;
}

/// In-memory backend for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Direct read of a saved table, for assertions.
    pub fn saved(&self, key: &str) -> Option<Table> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.get(key).cloned()
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Table> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        Ok(tables.get(key).cloned().unwrap_or_default())
    }

    fn save(&self, key: &str, entries: &Table) -> Result<()> {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.insert(key.to_string(), entries.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn unsaved_store_loads_empty() {
        let backend = MemoryBackend::new();
        assert!(backend.load("nothing_here").unwrap().is_empty());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let backend = MemoryBackend::new();
        let mut table = Table::new();
        table.insert("a".into(), serde_json::json!({"x": 1}));
        backend.save("things", &table).unwrap();
        assert_eq!(backend.load("things").unwrap(), table);
    }
}
