//! Fleet configuration resolved from the process environment.
//!
//! Each bot identity carries its own credential, sourced from a dedicated
//! environment variable. An unset or empty variable means the identity is
//! skipped at startup, not an error.

pub mod env;
pub mod schema;

pub use {
    env::resolve_data_dir,
    schema::{FleetConfig, Identity, IdentityDef},
};
