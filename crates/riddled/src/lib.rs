//! riddled library - exposes modules for testing.

pub mod metrics;
pub mod routes;
pub mod server;
pub mod session;
