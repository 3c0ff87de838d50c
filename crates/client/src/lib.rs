//! `blogdesk-client`
//!
//! **Responsibility:** session and authorization core of the blog admin client.
//!
//! This crate provides:
//! - Durable session storage (in-memory and SQLite-backed)
//! - Session state with a reactive snapshot channel
//! - Bearer credential injection for outgoing calls
//! - Classification of server-reported failures and recovery (teardown, redirects)
//! - A route guard gating navigation by authentication and role
//! - The account flows that acquire, refresh and drop credentials
//!
//! Rendering is someone else's job: the crate talks to the UI only through the
//! [`collaborators`] traits.

pub mod account;
pub mod app;
pub mod classifier;
pub mod client;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod injector;
#[cfg(not(target_arch = "wasm32"))]
pub mod refresh;
pub mod routes;
pub mod session;
#[cfg(not(target_arch = "wasm32"))]
pub mod sqlite_store;
pub mod storage;
pub mod transport;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use account::{AccountService, EmailLoginForm, RegisterForm, ResetPasswordForm};
pub use app::{BlogClient, BlogClientBuilder};
pub use classifier::{ErrorClass, ErrorClassifier, Recovery, RecoveryAction};
pub use client::ApiClient;
pub use collaborators::{Collaborators, Headless, Navigator, Notice, Notifier, ProgressIndicator, Severity};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use gateway::{ApiFailure, Gateway};
pub use guard::{GuardDecision, NavigationOutcome, RouteGuard};
pub use injector::AuthInjector;
#[cfg(not(target_arch = "wasm32"))]
pub use refresh::RefreshScheduler;
pub use routes::{RouteMeta, RouteName, RouteTable};
pub use session::{Session, SessionState};
#[cfg(not(target_arch = "wasm32"))]
pub use sqlite_store::SqliteStore;
pub use storage::{DurableStore, MemoryStore, StorageArea, StoreError, StoreKey};
pub use transport::{ApiRequest, Method, RawResponse, ReqwestTransport, Transport, TransportError};
pub use validation::{SessionValidator, Validation};
