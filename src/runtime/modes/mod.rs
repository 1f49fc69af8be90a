//! Mode routing
//!
//! - Server mode (HTTP server, default)
//! - CLI mode (one-shot maintenance commands)

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "server")]
pub use server::run_server;

#[cfg(feature = "cli")]
pub use cli::run_cli;
