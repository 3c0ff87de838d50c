//! Session state: the single mutable aggregate of the client core.
//!
//! The in-memory value lives in a `watch` channel so observers (UI bindings,
//! the refresh scheduler) see every change. Durable copies of the credentials
//! live in a [`DurableStore`]. No operation here fails: store problems are
//! logged and the in-memory state stays authoritative for the process.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use blogdesk_auth::{Credentials, Principal, PrincipalPatch};

use crate::storage::{DurableStore, MemoryStore, StoreKey, keys};

/// Snapshot of the current principal and its credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    /// Unix-epoch seconds; `0` means unknown/expired.
    pub expires_at: i64,
    pub principal: Principal,
    pub remember: bool,
}

impl SessionState {
    /// Whether an access token is held. Says nothing about server acceptance.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

impl core::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "<redacted>");
        f.debug_struct("SessionState")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .field("principal", &self.principal)
            .field("remember", &self.remember)
            .finish()
    }
}

/// Shared handle to the session.
///
/// Cheap to clone; every clone observes and mutates the same state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn DurableStore>,
    state: watch::Sender<SessionState>,
    /// Serializes mutations so memory and store change in the same order.
    write_gate: Mutex<()>,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session").field("state", &*self.inner.state.borrow()).finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Session {
    /// Build the session from whatever the store holds.
    pub async fn restore(store: Arc<dyn DurableStore>) -> Self {
        let read = |key: StoreKey| {
            let store = store.clone();
            async move {
                match store.get(key).await {
                    Ok(value) => value,
                    Err(err) => {
                        tracing::warn!(%key, error = %err, "failed to read persisted session value");
                        None
                    }
                }
            }
        };

        let access_token = non_empty(read(keys::TOKEN).await);
        let refresh_token = non_empty(read(keys::REFRESH_TOKEN).await);
        let scope = non_empty(read(keys::SCOPE).await);
        let expires_at = read(keys::EXPIRED_AT)
            .await
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);
        let remember = read(keys::REMEMBER_ME).await.as_deref() == Some("true");

        let state = SessionState {
            access_token,
            refresh_token,
            scope,
            expires_at,
            principal: Principal::default(),
            remember,
        };

        tracing::info!(
            authenticated = state.is_authenticated(),
            scope = ?state.scope,
            "session restored"
        );

        Self::with_state(store, state)
    }

    /// Empty session over a fresh in-memory store.
    pub fn detached() -> Self {
        Self::with_state(Arc::new(MemoryStore::new()), SessionState::default())
    }

    fn with_state(store: Arc<dyn DurableStore>, state: SessionState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self {
            inner: Arc::new(Inner {
                store,
                state: tx,
                write_gate: Mutex::new(()),
            }),
        }
    }

    /// Store a freshly issued set of credentials and persist them.
    ///
    /// Empty strings are stored as absent: an empty token means "no token",
    /// and an empty scope or refresh token reads back as `None`, the same way
    /// [`restore`](Session::restore) treats them.
    pub async fn set(&self, credentials: Credentials) {
        let _gate = self.inner.write_gate.lock().await;

        let Credentials {
            token,
            scope,
            refresh_token,
            expired_at,
        } = credentials;

        let entries = vec![
            (keys::TOKEN, token.clone()),
            (keys::SCOPE, scope.clone()),
            (keys::REFRESH_TOKEN, refresh_token.clone()),
            (keys::EXPIRED_AT, expired_at.to_string()),
        ];

        self.inner.state.send_modify(|state| {
            state.access_token = non_empty(Some(token));
            state.scope = non_empty(Some(scope));
            state.refresh_token = non_empty(Some(refresh_token));
            state.expires_at = expired_at;
        });

        if let Err(err) = self.inner.store.set_all(&entries).await {
            tracing::warn!(error = %err, "failed to persist credentials; session kept in memory only");
        }

        tracing::info!(scope = ?self.scope(), expires_at = expired_at, "session credentials stored");
    }

    /// Record whether credentials should survive restarts.
    pub async fn set_remember(&self, remember: bool) {
        let _gate = self.inner.write_gate.lock().await;

        self.inner.state.send_modify(|state| state.remember = remember);

        let value = if remember { "true" } else { "false" };
        if let Err(err) = self.inner.store.set(keys::REMEMBER_ME, value).await {
            tracing::warn!(error = %err, "failed to persist remember flag");
        }
    }

    /// Merge a partial profile into the principal.
    pub fn merge_principal(&self, patch: PrincipalPatch) {
        if patch.is_empty() {
            return;
        }
        self.inner.state.send_modify(|state| state.principal.merge(patch));
    }

    /// Tear the session down: reset every field and remove every persisted key,
    /// including the tab-scoped UI cache, in one store operation.
    pub async fn clear(&self) {
        let _gate = self.inner.write_gate.lock().await;
        self.clear_locked().await;
    }

    /// Clear only while the session still holds `sent_with`, the token a
    /// rejected call went out with. Returns whether the session was cleared.
    ///
    /// A rejection of a credential that has since been replaced leaves the
    /// new session alone.
    pub async fn clear_if_token(&self, sent_with: Option<&str>) -> bool {
        let _gate = self.inner.write_gate.lock().await;

        if self.inner.state.borrow().access_token.as_deref() != sent_with {
            tracing::debug!("rejected credential was already replaced; keeping the session");
            return false;
        }
        self.clear_locked().await;
        true
    }

    async fn clear_locked(&self) {
        self.inner.state.send_replace(SessionState::default());

        if let Err(err) = self.inner.store.remove_all(&keys::SESSION).await {
            tracing::warn!(error = %err, "failed to remove persisted session; memory state cleared");
        }

        tracing::info!("session cleared");
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.state.borrow().refresh_token.clone()
    }

    pub fn scope(&self) -> Option<String> {
        self.inner.state.borrow().scope.clone()
    }

    pub fn expires_at(&self) -> i64 {
        self.inner.state.borrow().expires_at
    }

    pub fn principal(&self) -> Principal {
        self.inner.state.borrow().principal.clone()
    }

    pub fn remember(&self) -> bool {
        self.inner.state.borrow().remember
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Observe every change to the session.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StoreError, StoreResult};
    use async_trait::async_trait;
    use blogdesk_core::UserId;

    fn creds(token: &str, scope: &str) -> Credentials {
        Credentials {
            token: token.to_string(),
            scope: scope.to_string(),
            refresh_token: format!("refresh-{token}"),
            expired_at: 1_700_000_000,
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl DurableStore for BrokenStore {
        async fn get(&self, _key: StoreKey) -> StoreResult<Option<String>> {
            Err(StoreError::Unavailable("disk gone".into()))
        }
        async fn set_all(&self, _entries: &[(StoreKey, String)]) -> StoreResult<()> {
            Err(StoreError::Unavailable("disk gone".into()))
        }
        async fn remove_all(&self, _keys: &[StoreKey]) -> StoreResult<()> {
            Err(StoreError::Unavailable("disk gone".into()))
        }
    }

    #[tokio::test]
    async fn set_round_trips_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::restore(store.clone()).await;

        session.set(creds("t-1", "admin")).await;

        assert_eq!(session.token().as_deref(), Some("t-1"));
        assert_eq!(session.scope().as_deref(), Some("admin"));
        assert_eq!(session.refresh_token().as_deref(), Some("refresh-t-1"));
        assert_eq!(session.expires_at(), 1_700_000_000);

        let persisted = store.snapshot();
        assert_eq!(persisted.get(&keys::TOKEN).map(String::as_str), Some("t-1"));
        assert_eq!(persisted.get(&keys::EXPIRED_AT).map(String::as_str), Some("1700000000"));
    }

    #[tokio::test]
    async fn restore_reads_persisted_layout() {
        let store = Arc::new(MemoryStore::with_entries([
            (keys::TOKEN, "t-9".to_string()),
            (keys::SCOPE, "user".to_string()),
            (keys::REFRESH_TOKEN, "r-9".to_string()),
            (keys::EXPIRED_AT, "1234".to_string()),
            (keys::REMEMBER_ME, "true".to_string()),
        ]));

        let session = Session::restore(store).await;
        let state = session.snapshot();
        assert_eq!(state.access_token.as_deref(), Some("t-9"));
        assert_eq!(state.scope.as_deref(), Some("user"));
        assert_eq!(state.refresh_token.as_deref(), Some("r-9"));
        assert_eq!(state.expires_at, 1234);
        assert!(state.remember);
        assert!(state.principal.is_anonymous());
    }

    #[tokio::test]
    async fn restore_tolerates_garbage_expiry() {
        let store = Arc::new(MemoryStore::with_entries([(keys::EXPIRED_AT, "soon".to_string())]));
        let session = Session::restore(store).await;
        assert_eq!(session.expires_at(), 0);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn clear_removes_every_persisted_key() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::restore(store.clone()).await;
        session.set(creds("t-1", "admin")).await;
        session.set_remember(true).await;
        store.set(keys::TABS, "[\"posts\"]").await.unwrap();
        session.merge_principal(PrincipalPatch {
            name: Some("ada".into()),
            ..PrincipalPatch::default()
        });

        session.clear().await;

        assert_eq!(session.snapshot(), SessionState::default());
        assert!(store.snapshot().is_empty(), "left behind: {:?}", store.snapshot());

        // Idempotent.
        session.clear().await;
        assert_eq!(session.snapshot(), SessionState::default());
    }

    #[tokio::test]
    async fn clear_if_token_spares_a_replaced_credential() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::restore(store.clone()).await;
        session.set(creds("t-2", "admin")).await;

        assert!(!session.clear_if_token(Some("t-1")).await);
        assert_eq!(session.token().as_deref(), Some("t-2"));
        assert!(!session.clear_if_token(None).await);
        assert_eq!(store.snapshot().get(&keys::TOKEN).map(String::as_str), Some("t-2"));

        assert!(session.clear_if_token(Some("t-2")).await);
        assert_eq!(session.snapshot(), SessionState::default());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn empty_credential_fields_read_back_as_absent() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::restore(store.clone()).await;

        session
            .set(Credentials {
                token: "t-1".to_string(),
                scope: String::new(),
                refresh_token: String::new(),
                expired_at: 0,
            })
            .await;

        assert_eq!(session.token().as_deref(), Some("t-1"));
        assert_eq!(session.scope(), None);
        assert_eq!(session.refresh_token(), None);

        let restored = Session::restore(store).await;
        assert_eq!(restored.snapshot(), session.snapshot());
    }

    #[tokio::test]
    async fn principal_is_merged_not_replaced() {
        let session = Session::detached();
        session.merge_principal(PrincipalPatch {
            id: Some(UserId::new(4)),
            email: Some("ada@example.com".into()),
            ..PrincipalPatch::default()
        });
        session.merge_principal(PrincipalPatch {
            role: Some("admin".into()),
            ..PrincipalPatch::default()
        });

        let principal = session.principal();
        assert_eq!(principal.id, UserId::new(4));
        assert_eq!(principal.email, "ada@example.com");
        assert_eq!(principal.role, "admin");
    }

    #[tokio::test]
    async fn store_failures_never_surface() {
        let session = Session::restore(Arc::new(BrokenStore)).await;
        assert!(!session.is_authenticated());

        session.set(creds("t-1", "user")).await;
        assert_eq!(session.token().as_deref(), Some("t-1"));

        session.clear().await;
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let session = Session::detached();
        let mut rx = session.subscribe();

        session.set(creds("t-1", "user")).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());

        session.clear().await;
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_authenticated());
    }

    #[test]
    fn debug_redacts_tokens() {
        let state = SessionState {
            access_token: Some("very-secret".into()),
            ..SessionState::default()
        };
        assert!(!format!("{state:?}").contains("very-secret"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn runtime() -> tokio::runtime::Runtime {
            tokio::runtime::Builder::new_current_thread().build().unwrap()
        }

        proptest! {
            #[test]
            fn set_then_get_round_trips(
                token in "[A-Za-z0-9._-]{1,40}",
                scope in "[a-z]{1,10}",
                refresh in "[A-Za-z0-9._-]{1,40}",
                expired_at in any::<i64>(),
            ) {
                let rt = runtime();
                let session = rt.block_on(Session::restore(Arc::new(MemoryStore::new())));
                rt.block_on(session.set(Credentials {
                    token: token.clone(),
                    scope: scope.clone(),
                    refresh_token: refresh.clone(),
                    expired_at,
                }));

                prop_assert_eq!(session.token(), Some(token));
                prop_assert_eq!(session.scope(), Some(scope));
                prop_assert_eq!(session.refresh_token(), Some(refresh));
                prop_assert_eq!(session.expires_at(), expired_at);
            }

            #[test]
            fn persisted_session_restores_identically(
                token in "[A-Za-z0-9._-]{1,40}",
                scope in "[a-z]{1,10}",
                expired_at in any::<i64>(),
                remember in any::<bool>(),
            ) {
                let rt = runtime();
                let store = Arc::new(MemoryStore::new());
                let session = rt.block_on(Session::restore(store.clone()));
                rt.block_on(session.set(Credentials {
                    token,
                    scope,
                    refresh_token: "r".into(),
                    expired_at,
                }));
                rt.block_on(session.set_remember(remember));

                let restored = rt.block_on(Session::restore(store));
                prop_assert_eq!(restored.snapshot(), session.snapshot());
            }

            #[test]
            fn clear_resets_any_state(
                token in proptest::option::of("[a-z]{1,8}"),
                remember in any::<bool>(),
                name in ".{0,8}",
            ) {
                let rt = runtime();
                let store = Arc::new(MemoryStore::new());
                let session = rt.block_on(Session::restore(store.clone()));
                if let Some(token) = token {
                    rt.block_on(session.set(Credentials {
                        token,
                        scope: "user".into(),
                        refresh_token: "r".into(),
                        expired_at: 5,
                    }));
                }
                rt.block_on(session.set_remember(remember));
                session.merge_principal(PrincipalPatch { name: Some(name), ..PrincipalPatch::default() });

                rt.block_on(session.clear());

                prop_assert_eq!(session.token(), None);
                prop_assert_eq!(session.scope(), None);
                prop_assert_eq!(session.refresh_token(), None);
                prop_assert_eq!(session.expires_at(), 0);
                prop_assert!(!session.remember());
                prop_assert_eq!(session.principal(), Principal::default());
                prop_assert!(store.snapshot().is_empty());
            }
        }
    }
}
