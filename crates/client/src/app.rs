//! Wiring of the client core.

use std::sync::Arc;

use crate::account::AccountService;
use crate::classifier::ErrorClassifier;
use crate::client::ApiClient;
use crate::collaborators::Collaborators;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::gateway::Gateway;
use crate::guard::RouteGuard;
use crate::routes::RouteTable;
use crate::session::Session;
use crate::storage::{DurableStore, MemoryStore};
use crate::transport::{ReqwestTransport, Transport};
use crate::validation::SessionValidator;

/// Everything the UI layer needs, built once at startup and shared.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct BlogClient {
    config: Arc<ClientConfig>,
    session: Session,
    api: ApiClient,
    validator: SessionValidator,
    guard: RouteGuard,
    account: AccountService,
}

impl BlogClient {
    pub fn builder(config: ClientConfig) -> BlogClientBuilder {
        BlogClientBuilder {
            config,
            store: None,
            transport: None,
            collaborators: Collaborators::headless(),
            routes: RouteTable::blog_defaults(),
        }
    }

    /// Desktop setup: HTTP transport and the SQLite session file in the
    /// platform data directory.
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn connect(config: ClientConfig, collaborators: Collaborators) -> ClientResult<Self> {
        let store = crate::sqlite_store::SqliteStore::open_default()
            .map_err(|e| crate::error::ClientError::config(format!("{e:#}")))?;
        Self::builder(config)
            .store(Arc::new(store))
            .collaborators(collaborators)
            .build()
            .await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn validator(&self) -> &SessionValidator {
        &self.validator
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn account(&self) -> &AccountService {
        &self.account
    }

    /// Start renewing the access token ahead of expiry.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn start_refresh(&self) -> crate::refresh::RefreshScheduler {
        crate::refresh::RefreshScheduler::start(
            self.account.clone(),
            self.session.clone(),
            self.config.refresh_lead,
        )
    }
}

pub struct BlogClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn DurableStore>>,
    transport: Option<Arc<dyn Transport>>,
    collaborators: Collaborators,
    routes: RouteTable,
}

impl BlogClientBuilder {
    #[must_use]
    pub fn store(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    #[must_use]
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Restore the session and assemble the pipeline.
    ///
    /// Without an explicit store the session lives in memory only; without an
    /// explicit transport requests go over HTTP to `config.base_url`.
    pub async fn build(self) -> ClientResult<BlogClient> {
        let Self {
            config,
            store,
            transport,
            collaborators,
            routes,
        } = self;

        let transport = match transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config)?),
        };
        let store = store.unwrap_or_else(|| Arc::new(MemoryStore::new()));

        let session = Session::restore(store).await;
        let gateway = Gateway::new(transport, session.clone());
        let validator = SessionValidator::new(
            gateway.clone(),
            session.clone(),
            collaborators.notifier.clone(),
            config.notice_duration,
        );
        let classifier = ErrorClassifier::new(&config, session.clone(), validator.clone(), &collaborators);
        let api = ApiClient::new(gateway, classifier);
        let guard = RouteGuard::new(&config, routes, session.clone(), validator.clone(), &collaborators);
        let account = AccountService::new(api.clone(), session.clone());

        tracing::info!(base_url = %config.base_url, app = %config.app_name, "client core ready");

        Ok(BlogClient {
            config: Arc::new(config),
            session,
            api,
            validator,
            guard,
            account,
        })
    }
}
