use std::sync::Arc;

use crate::{
    backend::{MemoryBackend, StoreBackend},
    cooldown::CooldownGate,
    directory::Directory,
    error::Result,
};

/// Logical store names, matching the JSON file names on disk.
pub mod keys {
    pub const AVATARS: &str = "avatars_data";
    pub const SERVERS: &str = "servers_data";
    pub const TAGS: &str = "tags_data";
    pub const USER_COOLDOWNS: &str = "user_cooldowns";
    pub const SEARCH_COOLDOWNS: &str = "search_cooldowns";
    pub const CONTROL: &str = "control_panel_data";
}

/// Every persisted store, loaded once at process start and handed by
/// reference into each command handler invocation.
pub struct SharedState {
    pub avatars: Directory,
    pub servers: Directory,
    pub tags: Directory,
    pub control: Directory,
    pub cooldowns: CooldownGate,
}

impl SharedState {
    /// Load all stores from the backend. Must complete before any
    /// connection starts serving events.
    pub fn load(backend: Arc<dyn StoreBackend>) -> Result<Self> {
        Ok(Self {
            avatars: Directory::load(keys::AVATARS, Arc::clone(&backend))?,
            servers: Directory::load(keys::SERVERS, Arc::clone(&backend))?,
            tags: Directory::load(keys::TAGS, Arc::clone(&backend))?,
            control: Directory::load(keys::CONTROL, Arc::clone(&backend))?,
            cooldowns: CooldownGate::load(&backend)?,
        })
    }

    /// Fresh state on a memory backend, for tests and dry runs.
    pub fn in_memory() -> Self {
        match Self::load(MemoryBackend::new()) {
            Ok(state) => state,
            Err(_) => unreachable!("memory backend load cannot fail"),
        }
    }
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState")
            .field("avatars", &self.avatars.len())
            .field("servers", &self.servers.len())
            .field("tags", &self.tags.len())
            .field("control", &self.control.len())
            .finish_non_exhaustive()
    }
}
