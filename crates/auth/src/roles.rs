use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Coarse role marker used for route-level authorization.
///
/// The server hands the client a scope string at login ("admin", "user", ...).
/// Roles stay opaque strings here; the server is the authority on what they
/// grant, the client only compares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a persisted scope string grants this role.
    pub fn is_granted_by(&self, scope: &str) -> bool {
        self.as_str() == scope
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}
