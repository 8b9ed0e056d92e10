//! Error types for the Report Store.

use thiserror::Error;
use trace2pass_domain::Trace2PassError;

/// Errors raised by `BugStore` implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database connection error (SurrealDB backend only).
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Database query error.
    #[error("database query failed: {0}")]
    Query(String),

    /// Schema setup error.
    #[error("schema setup failed: {0}")]
    SchemaSetup(String),

    /// No record exists for the given fingerprint.
    #[error("bug record not found: {fingerprint}")]
    NotFound { fingerprint: String },

    /// A transactional create/update did not return the expected row.
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// Status transition violated the monotonic lifecycle (I2).
    #[error("invalid status transition for {fingerprint}: {reason}")]
    InvalidTransition { fingerprint: String, reason: String },

    /// Domain-level validation error, propagated from `trace2pass-domain`.
    #[error(transparent)]
    Domain(#[from] Trace2PassError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
