/// Catalog storage backends for games, reviews and users.
pub mod catalog_store;
/// Entity identifiers shared by every backend.
pub mod id;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
