//! Client configuration.

use std::time::Duration;

use reqwest::Url;

use crate::error::ClientError;
use crate::routes::RouteName;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8888/api/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_millis(3000);
pub const DEFAULT_APP_NAME: &str = "Blogdesk";
pub const DEFAULT_REFRESH_LEAD: Duration = Duration::from_secs(60);

/// Settings for the client core.
///
/// Use [`from_env()`](ClientConfig::from_env) for convention-based setup, or
/// [`default()`](ClientConfig::default) with `with_*` methods for full control.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; endpoint paths are resolved relative to it.
    pub base_url: Url,
    pub timeout: Duration,
    /// How long notices stay on screen.
    pub notice_duration: Duration,
    /// Suffix of every document title.
    pub app_name: String,
    pub login_route: RouteName,
    pub forbidden_route: RouteName,
    /// Fallback destination when an authenticated user hits an entry route
    /// with no origin to go back to.
    pub home_route: RouteName,
    /// How long before expiry the optional refresh scheduler renews the token.
    pub refresh_lead: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: normalize_base(DEFAULT_API_URL.parse().expect("default API URL is valid")),
            timeout: DEFAULT_TIMEOUT,
            notice_duration: DEFAULT_NOTICE_DURATION,
            app_name: DEFAULT_APP_NAME.to_string(),
            login_route: RouteName::LOGIN,
            forbidden_route: RouteName::FORBIDDEN,
            home_route: RouteName::ADMIN,
            refresh_lead: DEFAULT_REFRESH_LEAD,
        }
    }
}

/// Make sure relative endpoint paths resolve under the base path.
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl ClientConfig {
    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `BLOGDESK_API_URL`: API root (must be a valid URL)
    /// - `BLOGDESK_TIMEOUT_SECS`: request timeout in seconds
    /// - `BLOGDESK_NOTICE_MS`: notice display duration in milliseconds
    /// - `BLOGDESK_APP_NAME`: document title suffix
    /// - `BLOGDESK_REFRESH_LEAD_SECS`: refresh scheduler lead time
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](ClientConfig::from_env) with an explicit source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("BLOGDESK_API_URL") {
            let url: Url = raw
                .parse()
                .map_err(|e| ClientError::config(format!("BLOGDESK_API_URL: {e}")))?;
            config = config.with_base_url(url);
        }
        if let Some(raw) = lookup("BLOGDESK_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("BLOGDESK_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("BLOGDESK_NOTICE_MS") {
            config.notice_duration = Duration::from_millis(parse_number("BLOGDESK_NOTICE_MS", &raw)?);
        }
        if let Some(name) = lookup("BLOGDESK_APP_NAME") {
            config.app_name = name;
        }
        if let Some(raw) = lookup("BLOGDESK_REFRESH_LEAD_SECS") {
            config.refresh_lead = Duration::from_secs(parse_number("BLOGDESK_REFRESH_LEAD_SECS", &raw)?);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = normalize_base(url);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_notice_duration(mut self, duration: Duration) -> Self {
        self.notice_duration = duration;
        self
    }

    #[must_use]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    #[must_use]
    pub fn with_login_route(mut self, route: RouteName) -> Self {
        self.login_route = route;
        self
    }

    #[must_use]
    pub fn with_forbidden_route(mut self, route: RouteName) -> Self {
        self.forbidden_route = route;
        self
    }

    #[must_use]
    pub fn with_home_route(mut self, route: RouteName) -> Self {
        self.home_route = route;
        self
    }

    #[must_use]
    pub fn with_refresh_lead(mut self, lead: Duration) -> Self {
        self.refresh_lead = lead;
        self
    }
}

fn parse_number(var: &str, raw: &str) -> Result<u64, ClientError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ClientError::config(format!("{var}: {e}")))
}
