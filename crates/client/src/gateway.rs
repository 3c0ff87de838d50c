//! Request pipeline below the classifier: inject, transmit, decode.

use std::sync::Arc;

use thiserror::Error;

use blogdesk_core::{ApiStatus, Envelope};

use crate::injector::AuthInjector;
use crate::session::Session;
use crate::transport::{ApiRequest, Transport, TransportError};

/// Structured outcome of a failed remote call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// The server answered with a non-zero status discriminator.
    #[error("server rejected the call with {status}{}", message_suffix(.message))]
    Rejected {
        status: ApiStatus,
        message: Option<String>,
        http_status: u16,
    },

    /// The call never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response arrived but was not an envelope (or contradicted its status line).
    #[error("malformed response (HTTP {http_status}): {detail}")]
    Malformed { http_status: u16, detail: String },
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl ApiFailure {
    /// Server status discriminator, when the server sent one.
    pub fn status(&self) -> Option<ApiStatus> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Sends requests through the injector and decodes envelopes.
///
/// Failures come back unclassified; callers that need recovery go through
/// [`crate::ApiClient`].
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    injector: AuthInjector,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self {
            transport,
            injector: AuthInjector::new(session),
        }
    }

    pub fn with_injector(transport: Arc<dyn Transport>, injector: AuthInjector) -> Self {
        Self { transport, injector }
    }

    pub async fn send_unclassified(&self, request: ApiRequest) -> Result<Envelope, ApiFailure> {
        self.send_tracked(request).await.1
    }

    /// Like [`send_unclassified`](Gateway::send_unclassified), also returning
    /// the session token held when the request left. Recovery compares it with
    /// the session to tell a rejection of the current credential from one of a
    /// credential that has been replaced in the meantime.
    pub(crate) async fn send_tracked(&self, mut request: ApiRequest) -> (Option<String>, Result<Envelope, ApiFailure>) {
        let sent_with = self.injector.session_token();
        self.injector.decorate(&mut request);
        (sent_with, self.transmit(request).await)
    }

    async fn transmit(&self, request: ApiRequest) -> Result<Envelope, ApiFailure> {

        let endpoint = request.endpoint().to_string();
        let method = request.method;
        tracing::debug!(?method, endpoint = %endpoint, "sending request");

        let response = self.transport.execute(request).await.map_err(|err| {
            tracing::warn!(endpoint = %endpoint, error = %err, "request did not complete");
            ApiFailure::Transport(err)
        })?;

        let envelope = Envelope::decode(&response.body).map_err(|err| ApiFailure::Malformed {
            http_status: response.http_status,
            detail: err.to_string(),
        })?;

        if !envelope.is_ok() {
            tracing::debug!(endpoint = %endpoint, status = %envelope.status, "server rejected request");
            return Err(ApiFailure::Rejected {
                status: envelope.status,
                message: envelope.message().map(str::to_string),
                http_status: response.http_status,
            });
        }

        if !response.is_success() {
            return Err(ApiFailure::Malformed {
                http_status: response.http_status,
                detail: "success status with an error status line".to_string(),
            });
        }

        Ok(envelope)
    }
}
