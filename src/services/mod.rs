//! Service layer for business logic
//!
//! Shared between the HTTP API and the CLI.

mod session_service;
mod user_service;
mod username_service;

pub use session_service::*;
pub use user_service::*;
pub use username_service::*;
