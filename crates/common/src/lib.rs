//! Shared error plumbing used across all qren crates.

pub mod error;

pub use error::{Error, FromMessage, Result};
