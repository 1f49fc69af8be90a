//! clicker - click accounting backend for a Telegram mini-game
//!
//! Counts clicks per user against a durable store, enforces a per-user rate
//! limit, and serves leaderboards and a global total from short-lived caches.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line maintenance commands
//!
//! # Architecture
//! - `clicks`: rate limiter and click engine
//! - `leaderboard`: top-N, viewer rank and global total
//! - `services`: users, usernames and sessions
//! - `storage`: durable store (SeaORM) and its traits
//! - `cache`: counter cache backends (Redis, in-memory)
//! - `api`: HTTP services and middleware
//! - `interfaces`: CLI commands
//! - `config`: static configuration
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging setup

pub mod api;
pub mod cache;
pub mod cli;
pub mod clicks;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod leaderboard;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
