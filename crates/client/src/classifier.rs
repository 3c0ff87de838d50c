//! Maps failed calls to user-facing recovery.
//!
//! Every failure is classified, a recovery action runs (notice, session
//! teardown, redirect) and the class travels back to the caller inside
//! [`crate::ClientError::Api`]. Nothing here fails.

use std::sync::Arc;
use std::time::Duration;

use blogdesk_core::ApiStatus;

use crate::collaborators::{Collaborators, Navigator, Notice, Notifier, Severity};
use crate::config::ClientConfig;
use crate::gateway::ApiFailure;
use crate::routes::RouteName;
use crate::session::Session;
use crate::validation::{SIGN_IN_EXPIRED, SessionValidator, Validation};

const REQUEST_FAILED: &str = "Request failed.";
const NO_PERMISSION: &str = "You do not have permission to access this page.";
const SIGN_IN_FIRST: &str = "Please sign in first.";
const CHECK_FAILED: &str = "Failed to check sign-in status.";
const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// Status 1: the server refused the operation and says why.
    BusinessRuleViolation { message: Option<String> },
    /// Status 2: the credential is no longer accepted.
    CredentialInvalid,
    /// Status 7: either the role is insufficient or the session is gone.
    Forbidden,
    /// Anything else, including transport and decoding failures.
    Unclassified,
}

impl ErrorClass {
    pub fn of(failure: &ApiFailure) -> Self {
        match failure.status() {
            Some(ApiStatus::BusinessRule) => Self::BusinessRuleViolation {
                message: failure.server_message().map(str::to_string),
            },
            Some(ApiStatus::CredentialInvalid) => Self::CredentialInvalid,
            Some(ApiStatus::Forbidden) => Self::Forbidden,
            _ => Self::Unclassified,
        }
    }
}

impl core::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BusinessRuleViolation { .. } => f.write_str("business rule violation"),
            Self::CredentialInvalid => f.write_str("credential invalid"),
            Self::Forbidden => f.write_str("forbidden"),
            Self::Unclassified => f.write_str("unclassified failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    Notified,
    SessionCleared,
    /// The rejected credential had already been replaced; nothing was done.
    Superseded,
    Redirected(RouteName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    pub class: ErrorClass,
    pub action: RecoveryAction,
}

#[derive(Clone)]
pub struct ErrorClassifier {
    session: Session,
    validator: SessionValidator,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    login_route: RouteName,
    forbidden_route: RouteName,
    notice_duration: Duration,
}

impl ErrorClassifier {
    pub fn new(
        config: &ClientConfig,
        session: Session,
        validator: SessionValidator,
        collaborators: &Collaborators,
    ) -> Self {
        Self {
            session,
            validator,
            notifier: collaborators.notifier.clone(),
            navigator: collaborators.navigator.clone(),
            login_route: config.login_route.clone(),
            forbidden_route: config.forbidden_route.clone(),
            notice_duration: config.notice_duration,
        }
    }

    /// Run the recovery for `failure`. `sent_with` is the session token held
    /// when the failed call left; a credential rejection only tears the
    /// session down while that token is still current.
    pub async fn recover(&self, failure: &ApiFailure, sent_with: Option<&str>) -> Recovery {
        let class = ErrorClass::of(failure);
        tracing::debug!(%class, %failure, "recovering from failed call");

        let action = match &class {
            ErrorClass::BusinessRuleViolation { message } => {
                self.notice(Severity::Error, message.as_deref().unwrap_or(REQUEST_FAILED));
                RecoveryAction::Notified
            }
            ErrorClass::CredentialInvalid => {
                if self.session.clear_if_token(sent_with).await {
                    self.notice(Severity::Warning, SIGN_IN_EXPIRED);
                    RecoveryAction::SessionCleared
                } else {
                    RecoveryAction::Superseded
                }
            }
            ErrorClass::Forbidden => self.disambiguate_forbidden().await,
            ErrorClass::Unclassified => {
                self.notice(Severity::Error, GENERIC_FAILURE);
                RecoveryAction::Notified
            }
        };

        Recovery { class, action }
    }

    /// A forbidden answer means different things for a live and a dead session.
    async fn disambiguate_forbidden(&self) -> RecoveryAction {
        let route = match self.validator.check_quietly().await {
            Validation::Authenticated => {
                self.notice(Severity::Warning, NO_PERMISSION);
                self.forbidden_route.clone()
            }
            Validation::Unauthenticated => {
                self.notice(Severity::Warning, SIGN_IN_FIRST);
                self.login_route.clone()
            }
            Validation::Unreachable => {
                self.notice(Severity::Error, CHECK_FAILED);
                self.login_route.clone()
            }
        };
        tracing::info!(%route, "redirecting after forbidden response");
        self.navigator.push(&route);
        RecoveryAction::Redirected(route)
    }

    fn notice(&self, severity: Severity, message: &str) {
        self.notifier
            .notify(Notice::new(severity, message, self.notice_duration));
    }
}
