//! Wellness API Library Crate
//!
//! Configuration, shared state, REST handlers, the WebSocket conversation
//! loop and routing for the wellness check-in service. The `api` binary is a
//! thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod ws;
