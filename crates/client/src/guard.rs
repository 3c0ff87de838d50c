//! Navigation guard.
//!
//! Runs before every route change. Routes declare what they need in
//! [`RouteMeta`]; the guard asks the server whether the session is alive only
//! when a route actually depends on it. Every branch is a value, never an
//! error.

use std::sync::Arc;
use std::time::Duration;

use blogdesk_auth::authorize_scope;
use blogdesk_core::NavigationId;

use crate::collaborators::{Collaborators, Navigator, Notice, Notifier, ProgressIndicator, Severity};
use crate::config::ClientConfig;
use crate::routes::{RouteMeta, RouteName, RouteTable};
use crate::session::Session;
use crate::validation::SessionValidator;

const ALREADY_SIGNED_IN: &str = "You are already signed in.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allowed,
    /// The route needs a session and there is none.
    DeniedNoAuth,
    /// The session is alive but its scope does not carry the route's role.
    DeniedWrongRole,
    /// A signed-in user tried to open an entry route.
    AlreadySignedIn { back_to: RouteName },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Allow,
    Redirect(RouteName),
}

impl NavigationOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[derive(Clone)]
pub struct RouteGuard {
    routes: Arc<RouteTable>,
    session: Session,
    validator: SessionValidator,
    notifier: Arc<dyn Notifier>,
    progress: Arc<dyn ProgressIndicator>,
    navigator: Arc<dyn Navigator>,
    login_route: RouteName,
    forbidden_route: RouteName,
    home_route: RouteName,
    app_name: String,
    notice_duration: Duration,
}

impl RouteGuard {
    pub fn new(
        config: &ClientConfig,
        routes: RouteTable,
        session: Session,
        validator: SessionValidator,
        collaborators: &Collaborators,
    ) -> Self {
        Self {
            routes: Arc::new(routes),
            session,
            validator,
            notifier: collaborators.notifier.clone(),
            progress: collaborators.progress.clone(),
            navigator: collaborators.navigator.clone(),
            login_route: config.login_route.clone(),
            forbidden_route: config.forbidden_route.clone(),
            home_route: config.home_route.clone(),
            app_name: config.app_name.clone(),
            notice_duration: config.notice_duration,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Before-hook: start the progress indicator, then decide.
    pub async fn before_each(&self, to: &RouteName, from: Option<&RouteName>) -> GuardDecision {
        self.progress.start();
        self.decide(NavigationId::new(), to, from).await
    }

    /// After-hook: stop the progress indicator and title the page.
    pub fn after_each(&self, to: &RouteName) {
        self.progress.stop();
        self.navigator.set_title(&self.title_for(to));
    }

    pub fn outcome(&self, decision: &GuardDecision) -> NavigationOutcome {
        match decision {
            GuardDecision::Allowed => NavigationOutcome::Allow,
            GuardDecision::DeniedNoAuth => NavigationOutcome::Redirect(self.login_route.clone()),
            GuardDecision::DeniedWrongRole => NavigationOutcome::Redirect(self.forbidden_route.clone()),
            GuardDecision::AlreadySignedIn { back_to } => NavigationOutcome::Redirect(back_to.clone()),
        }
    }

    /// Run a full navigation: hooks, title and redirect.
    ///
    /// The progress indicator is stopped even if the returned future is
    /// dropped before completion.
    pub async fn navigate(&self, to: &RouteName, from: Option<&RouteName>) -> NavigationOutcome {
        let id = NavigationId::new();
        self.progress.start();
        let mut running = Running {
            progress: self.progress.clone(),
            finished: false,
        };

        let decision = self.decide(id, to, from).await;
        let outcome = self.outcome(&decision);

        let landed = match &outcome {
            NavigationOutcome::Allow => to,
            NavigationOutcome::Redirect(route) => route,
        };
        if let NavigationOutcome::Redirect(route) = &outcome {
            tracing::info!(navigation = %id, %to, redirect = %route, "navigation redirected");
            self.navigator.push(route);
        }

        running.finished = true;
        self.after_each(landed);
        outcome
    }

    async fn decide(&self, id: NavigationId, to: &RouteName, from: Option<&RouteName>) -> GuardDecision {
        let meta = self.routes.get(to).cloned().unwrap_or_else(|| {
            tracing::debug!(navigation = %id, %to, "route has no metadata; treating as public");
            RouteMeta::public()
        });

        if !meta.needs_validation() {
            tracing::debug!(navigation = %id, %to, "public route");
            return GuardDecision::Allowed;
        }

        let validated = self.validator.validate().await.is_authenticated();

        let decision = if meta.require_auth {
            match (&meta.role, validated) {
                (_, false) => GuardDecision::DeniedNoAuth,
                (None, true) => GuardDecision::Allowed,
                (Some(role), true) => match authorize_scope(self.session.scope().as_deref(), role) {
                    Ok(()) => GuardDecision::Allowed,
                    Err(err) => {
                        tracing::debug!(navigation = %id, %to, error = %err, "scope check failed");
                        GuardDecision::DeniedWrongRole
                    }
                },
            }
        } else if validated {
            self.notifier.notify(Notice::new(
                Severity::Info,
                ALREADY_SIGNED_IN,
                self.notice_duration,
            ));
            GuardDecision::AlreadySignedIn {
                back_to: from.cloned().unwrap_or_else(|| self.home_route.clone()),
            }
        } else {
            GuardDecision::Allowed
        };

        tracing::debug!(navigation = %id, %to, ?decision, "guard decided");
        decision
    }

    fn title_for(&self, route: &RouteName) -> String {
        match self.routes.get(route).and_then(|m| m.title.as_deref()) {
            Some(title) => format!("{title} | {}", self.app_name),
            None => self.app_name.clone(),
        }
    }
}

/// Stops the progress indicator if a navigation is abandoned mid-flight.
struct Running {
    progress: Arc<dyn ProgressIndicator>,
    finished: bool,
}

impl Drop for Running {
    fn drop(&mut self) {
        if !self.finished {
            self.progress.stop();
        }
    }
}
