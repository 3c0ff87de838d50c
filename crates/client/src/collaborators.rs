//! Contracts for the UI-side collaborators the core calls into.
//!
//! The notification surface, the progress bar and the navigation engine are
//! owned by the UI layer. The core only needs these narrow traits.

use std::sync::Arc;
use std::time::Duration;

use crate::routes::RouteName;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub duration: Duration,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            severity,
            message: message.into(),
            duration,
        }
    }
}

/// Notification surface.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Global navigation progress indicator.
pub trait ProgressIndicator: Send + Sync {
    fn start(&self);
    fn stop(&self);
}

/// Navigation engine.
pub trait Navigator: Send + Sync {
    /// Navigate to a named route.
    fn push(&self, route: &RouteName);

    /// Set the window/document title.
    fn set_title(&self, title: &str);
}

/// Collaborators for running without a UI: everything goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Notifier for Headless {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Info => tracing::info!(message = %notice.message, "notice"),
            Severity::Warning => tracing::warn!(message = %notice.message, "notice"),
            Severity::Error => tracing::error!(message = %notice.message, "notice"),
        }
    }
}

impl ProgressIndicator for Headless {
    fn start(&self) {
        tracing::trace!("navigation progress started");
    }

    fn stop(&self) {
        tracing::trace!("navigation progress stopped");
    }
}

impl Navigator for Headless {
    fn push(&self, route: &RouteName) {
        tracing::info!(%route, "navigate");
    }

    fn set_title(&self, title: &str) {
        tracing::debug!(title, "title");
    }
}

/// The set of collaborators handed to the core at startup.
#[derive(Clone)]
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub progress: Arc<dyn ProgressIndicator>,
    pub navigator: Arc<dyn Navigator>,
}

impl Collaborators {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        progress: Arc<dyn ProgressIndicator>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            notifier,
            progress,
            navigator,
        }
    }

    pub fn headless() -> Self {
        let headless = Arc::new(Headless);
        Self {
            notifier: headless.clone(),
            progress: headless.clone(),
            navigator: headless,
        }
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::headless()
    }
}
