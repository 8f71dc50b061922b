use mongodb::error::Error as MongoError;
use thiserror::Error;

use crate::dao::id::EntityId;

/// Result alias for MongoDB store operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB backend, tagged with the operation that failed.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to write {kind} `{id}`")]
    Write {
        kind: &'static str,
        id: EntityId,
        #[source]
        source: MongoError,
    },
    #[error("failed to load {kind} `{id}`")]
    Load {
        kind: &'static str,
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list {kind}")]
    List {
        kind: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to replace the {kind} collection")]
    Replace {
        kind: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("duplicate value for unique field `{field}`")]
    Duplicate {
        field: &'static str,
        #[source]
        source: MongoError,
    },
}
