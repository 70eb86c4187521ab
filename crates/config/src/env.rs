use std::path::PathBuf;

use tracing::warn;

use crate::schema::FleetConfig;

impl FleetConfig {
    /// Build the process configuration from environment variables.
    ///
    /// `PORT` (default 5000) and `QREN_DATA_DIR` are honoured; CLI flags may
    /// override the result afterwards.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("PORT") {
            match raw.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(e) => warn!(value = %raw, error = %e, "invalid PORT, using default"),
            }
        }

        if let Ok(dir) = std::env::var("QREN_DATA_DIR")
            && !dir.is_empty()
        {
            config.data_dir = Some(PathBuf::from(dir));
        }

        config
    }
}

/// Resolve the directory the JSON stores live in.
///
/// Explicit override first, then the platform data dir (`~/.local/share/qren`
/// on Linux), then the current directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    directories::ProjectDirs::from("", "", "qren")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
