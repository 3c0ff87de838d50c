//! Remote confirmation that the held credential is still accepted.

use std::sync::Arc;
use std::time::Duration;

use blogdesk_auth::PrincipalPatch;
use blogdesk_core::ApiStatus;

use crate::collaborators::{Notice, Notifier, Severity};
use crate::gateway::{ApiFailure, Gateway};
use crate::session::Session;
use crate::transport::ApiRequest;

pub const VALIDATE_PATH: &str = "isValid";

pub(crate) const SIGN_IN_EXPIRED: &str = "Your sign-in has expired. Please sign in again.";

/// Result of asking the server about the current session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Validation {
    Authenticated,
    /// No credential, or the server refused the one still held. The session is
    /// empty afterwards.
    Unauthenticated,
    /// The server could not be asked. The session is left alone.
    Unreachable,
}

impl Validation {
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

#[derive(Clone)]
pub struct SessionValidator {
    gateway: Gateway,
    session: Session,
    notifier: Arc<dyn Notifier>,
    notice_duration: Duration,
}

impl SessionValidator {
    pub fn new(
        gateway: Gateway,
        session: Session,
        notifier: Arc<dyn Notifier>,
        notice_duration: Duration,
    ) -> Self {
        Self {
            gateway,
            session,
            notifier,
            notice_duration,
        }
    }

    /// Validate and tell the user why a rejected session ended.
    pub async fn validate(&self) -> Validation {
        self.run(true).await
    }

    /// Validate without surfacing any notice.
    pub async fn check_quietly(&self) -> Validation {
        self.run(false).await
    }

    pub async fn is_logged_in(&self) -> bool {
        self.validate().await.is_authenticated()
    }

    async fn run(&self, notify: bool) -> Validation {
        loop {
            if self.session.token().is_none() {
                tracing::debug!("no token held; skipping validation call");
                return Validation::Unauthenticated;
            }

            let (sent_with, result) = self.gateway.send_tracked(ApiRequest::get(VALIDATE_PATH)).await;
            match result {
                Ok(envelope) => {
                    match envelope.optional_data_as::<PrincipalPatch>() {
                        Ok(Some(patch)) => self.session.merge_principal(patch),
                        Ok(None) => {}
                        Err(err) => tracing::warn!(error = %err, "validation payload is not a profile; ignoring it"),
                    }
                    return Validation::Authenticated;
                }
                Err(ApiFailure::Rejected { status, message, .. }) => {
                    if !self.session.clear_if_token(sent_with.as_deref()).await {
                        tracing::debug!(%status, "credential replaced while validating; checking the new one");
                        continue;
                    }
                    tracing::info!(%status, "server refused the session");
                    if notify {
                        match status {
                            ApiStatus::BusinessRule => {
                                if let Some(message) = message {
                                    self.notice(Severity::Error, message);
                                }
                            }
                            ApiStatus::CredentialInvalid => self.notice(Severity::Warning, SIGN_IN_EXPIRED),
                            _ => {}
                        }
                    }
                    return Validation::Unauthenticated;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "session validation did not complete");
                    return Validation::Unreachable;
                }
            }
        }
    }

    fn notice(&self, severity: Severity, message: impl Into<String>) {
        self.notifier
            .notify(Notice::new(severity, message, self.notice_duration));
    }
}
