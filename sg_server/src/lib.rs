//! Multi-game lobby server library.
//!
//! Exposes the HTTP API router and server configuration so integration
//! tests can drive the router in-process.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
