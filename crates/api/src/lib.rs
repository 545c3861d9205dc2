//! Server Radar API server library.
//!
//! Exposes config, state, error handling, rate limiting and routes so
//! integration tests and the binary entrypoint share the same building
//! blocks.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod router;
pub mod routes;
pub mod state;
