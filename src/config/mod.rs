//! Static configuration
//!
//! Loaded once at startup from `config.toml` and `CLICKER__*` environment
//! variables. Components receive the sections they need at construction
//! time; only the runtime wiring reads the global instance.

mod r#impl;
mod structs;

pub use r#impl::{DEFAULT_CONFIG_PATH, get_config, init_config, update_config};
pub use structs::*;
