//! Library crate for gamevault-back, exposing modules for binaries and integration tests.

/// Runtime configuration loaded from file and environment.
pub mod config;
/// Storage entities and backends.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routers and handlers.
pub mod routes;
/// Business logic behind the routes.
pub mod services;
/// Shared application state.
pub mod state;
