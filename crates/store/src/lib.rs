//! Persisted state stores shared by every bot connection.
//!
//! Each logical store is a keyed mapping (`Directory`) backed by a
//! [`StoreBackend`]. Stores are loaded once at process start, before any
//! connection serves events, and flushed synchronously after every mutation.

pub mod backend;
pub mod cooldown;
pub mod directory;
pub mod error;
pub mod json;
pub mod shared;

pub use {
    backend::{MemoryBackend, StoreBackend, Table},
    cooldown::{CooldownClass, CooldownGate, Decision, unix_now_millis},
    directory::Directory,
    error::{Error, Result},
    json::JsonFileBackend,
    shared::{SharedState, keys},
};
