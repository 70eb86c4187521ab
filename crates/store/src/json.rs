use std::path::PathBuf;

use tracing::debug;

use crate::{
    backend::{StoreBackend, Table},
    error::{Context as _, Error, Result},
};

/// File-per-store JSON backend: each logical store lives at
/// `<dir>/<key>.json` as a pretty-printed object.
#[derive(Debug)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StoreBackend for JsonFileBackend {
    fn load(&self, key: &str) -> Result<Table> {
        let path = self.path(key);
        if !path.exists() {
            debug!(key, path = %path.display(), "store file absent, starting empty");
            return Ok(Table::new());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| Error::io(key, e))?;
        let table: Table =
            serde_json::from_str(&raw).with_context(|| format!("parse store '{key}'"))?;
        debug!(key, entries = table.len(), "loaded store");
        Ok(table)
    }

    fn save(&self, key: &str, entries: &Table) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::io(key, e))?;
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(self.path(key), raw).map_err(|e| Error::io(key, e))?;
        debug!(key, entries = entries.len(), "flushed store");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path());
        assert!(backend.load("tags_data").unwrap().is_empty());
    }

    #[test]
    fn save_creates_file_and_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("nested"));

        let mut table = Table::new();
        table.insert(
            "anime".into(),
            serde_json::json!({"link": "https://example.com"}),
        );
        backend.save("tags_data", &table).unwrap();

        assert!(dir.path().join("nested/tags_data.json").exists());
        assert_eq!(backend.load("tags_data").unwrap(), table);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tags_data.json"), "not json").unwrap();
        let backend = JsonFileBackend::new(dir.path());
        assert!(backend.load("tags_data").is_err());
    }
}
