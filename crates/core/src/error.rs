//! Wire-level error model.

use thiserror::Error;

/// Result type used when decoding API responses.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// A response body could not be understood as an API envelope.
///
/// Keep this focused on shape problems. Server-reported failures are carried
/// by [`crate::ApiStatus`], not by this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The body was not valid JSON or lacked the `status` discriminator.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// The envelope reported success but `data` did not match the expected shape.
    #[error("unexpected payload: {0}")]
    Payload(String),

    /// The envelope reported success but carried no `data`.
    #[error("missing payload")]
    MissingPayload,

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl EnvelopeError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
