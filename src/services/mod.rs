use crate::{dao::id::EntityId, error::ServiceError};

/// Password hashing and session tokens.
pub mod auth;
/// User collections (wishlist, favorites, completed games) and played hours.
pub mod collection_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game catalogue management.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Reviews and their synchronisation with the parent game.
pub mod review_service;
/// Background storage connection and degraded-mode tracking.
pub mod storage_supervisor;
/// Registration, login and profile projection.
pub mod user_service;

/// Parse a client-supplied identifier before it reaches the store.
fn parse_id(raw: &str) -> Result<EntityId, ServiceError> {
    Ok(EntityId::parse(raw)?)
}

/// Unwrap a field that request validation already marked as required.
fn required<T>(value: Option<T>, field: &str) -> Result<T, ServiceError> {
    value.ok_or_else(|| ServiceError::InvalidInput(format!("`{field}` is required")))
}
