//! Named routes and the declarative metadata the guard consults.

use std::borrow::Cow;
use std::collections::HashMap;

use blogdesk_auth::Role;
use serde::{Deserialize, Serialize};

/// Name of a route in the navigation engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteName(Cow<'static, str>);

impl RouteName {
    pub const LOGIN: RouteName = RouteName(Cow::Borrowed("login"));
    pub const REGISTER: RouteName = RouteName(Cow::Borrowed("register"));
    pub const RESET_PASSWORD: RouteName = RouteName(Cow::Borrowed("resetPassword"));
    pub const LOGIN_WITH_EMAIL: RouteName = RouteName(Cow::Borrowed("loginWithEmail"));
    pub const ADMIN: RouteName = RouteName(Cow::Borrowed("admin"));
    pub const FORBIDDEN: RouteName = RouteName(Cow::Borrowed("Forbidden"));
    pub const HOME: RouteName = RouteName(Cow::Borrowed("home"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RouteName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for RouteName {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

/// Per-route flags.
///
/// `require_auth` and `guest_only` are mutually exclusive in practice; when
/// both are set the guard treats the route as requiring authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub require_auth: bool,
    /// Credential-issuance entry routes an authenticated user is bounced from.
    pub guest_only: bool,
    pub role: Option<Role>,
    pub title: Option<String>,
}

impl RouteMeta {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            require_auth: true,
            ..Self::default()
        }
    }

    pub fn guest_only() -> Self {
        Self {
            guest_only: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Whether evaluating this route needs the validation endpoint.
    pub fn needs_validation(&self) -> bool {
        self.require_auth || self.guest_only
    }
}

/// Route table: route name to metadata.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<RouteName, RouteMeta>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The blog admin client's routes.
    pub fn blog_defaults() -> Self {
        Self::new()
            .with_route(RouteName::LOGIN, RouteMeta::guest_only().with_title("Sign in"))
            .with_route(RouteName::REGISTER, RouteMeta::guest_only().with_title("Register"))
            .with_route(
                RouteName::RESET_PASSWORD,
                RouteMeta::guest_only().with_title("Reset password"),
            )
            .with_route(
                RouteName::LOGIN_WITH_EMAIL,
                RouteMeta::guest_only().with_title("Sign in with email"),
            )
            .with_route(
                RouteName::ADMIN,
                RouteMeta::authenticated()
                    .with_role(Role::ADMIN)
                    .with_title("Admin console"),
            )
            .with_route(RouteName::FORBIDDEN, RouteMeta::public().with_title("Forbidden"))
            .with_route(RouteName::HOME, RouteMeta::public().with_title("Home"))
    }

    #[must_use]
    pub fn with_route(mut self, name: RouteName, meta: RouteMeta) -> Self {
        self.routes.insert(name, meta);
        self
    }

    pub fn get(&self, name: &RouteName) -> Option<&RouteMeta> {
        self.routes.get(name)
    }
}
