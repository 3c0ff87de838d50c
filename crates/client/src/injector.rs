//! Bearer credential injection for outgoing calls.

use std::borrow::Cow;

use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::session::Session;
use crate::transport::ApiRequest;

/// Endpoint suffixes that never receive the session credential.
///
/// These are pre-authentication flows. `refresh` carries its own bearer
/// (the refresh token) which must not be swapped for the access token.
pub const UNAUTHENTICATED_SUFFIXES: [&str; 5] =
    ["login", "register", "resetPassword", "refresh", "loginWithEmail"];

/// Decorates requests with `Authorization: Bearer <token>`.
///
/// Decisions are made on the endpoint path alone: no I/O, no failure. A
/// missing token means the call goes out uncredentialed and the server
/// decides.
#[derive(Debug, Clone)]
pub struct AuthInjector {
    session: Session,
    exempt: Vec<Cow<'static, str>>,
}

impl AuthInjector {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            exempt: UNAUTHENTICATED_SUFFIXES.iter().map(|s| Cow::Borrowed(*s)).collect(),
        }
    }

    /// Add an extra suffix to the allow-list.
    #[must_use]
    pub fn with_exempt_suffix(mut self, suffix: impl Into<Cow<'static, str>>) -> Self {
        self.exempt.push(suffix.into());
        self
    }

    pub fn is_exempt(&self, request: &ApiRequest) -> bool {
        let endpoint = request.endpoint();
        self.exempt.iter().any(|suffix| endpoint.ends_with(suffix.as_ref()))
    }

    pub(crate) fn session_token(&self) -> Option<String> {
        self.session.token()
    }

    pub fn decorate(&self, request: &mut ApiRequest) {
        if self.is_exempt(request) {
            return;
        }
        if request.headers.contains_key(AUTHORIZATION) {
            return;
        }
        let Some(token) = self.session.token() else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!(endpoint = request.endpoint(), "stored token is not a valid header value; sending uncredentialed");
            }
        }
    }
}
