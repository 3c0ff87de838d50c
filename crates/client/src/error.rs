//! Errors surfaced to callers of the client core.

use thiserror::Error;

use blogdesk_core::EnvelopeError;

use crate::classifier::ErrorClass;
use crate::gateway::ApiFailure;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error, Clone)]
pub enum ClientError {
    /// A remote call failed. Recovery (notices, teardown, redirects) has
    /// already run by the time the caller sees this.
    #[error("{class}: {failure}")]
    Api { class: ErrorClass, failure: ApiFailure },

    /// The operation needs a credential the session does not hold.
    #[error("not signed in")]
    NotAuthenticated,

    /// Local form validation failed before any I/O.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The call succeeded but its payload did not have the expected shape.
    #[error("unexpected response payload: {0}")]
    Payload(#[from] EnvelopeError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classification of a failed remote call, if this is one.
    pub fn class(&self) -> Option<&ErrorClass> {
        match self {
            Self::Api { class, .. } => Some(class),
            _ => None,
        }
    }
}
