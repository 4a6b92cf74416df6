//! Examark API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! engine, WebSocket infrastructure) so integration tests and the binary
//! entrypoint can both access them.

pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod notifications;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
