//! Error types shared across the Trace2Pass-Core workspace.

use thiserror::Error;

/// Errors raised while constructing or validating domain values.
#[derive(Error, Debug)]
pub enum Trace2PassError {
    /// A fingerprint/digest string was not valid lowercase SHA-256 hex.
    #[error("invalid digest: {digest}")]
    InvalidDigest { digest: String },

    /// An ingested event was missing a required field or had an unknown
    /// check kind.
    #[error("malformed anomaly event: {reason}")]
    MalformedEvent { reason: String },

    /// A status transition violated the monotonic lifecycle in I2.
    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidStatusTransition { from: String, to: String },

    /// Serialization/deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Trace2PassError {
    fn from(err: serde_json::Error) -> Self {
        Trace2PassError::Serialization(err.to_string())
    }
}

/// Result type for domain-level operations.
pub type Result<T> = std::result::Result<T, Trace2PassError>;
