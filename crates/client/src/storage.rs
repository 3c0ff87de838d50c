//! Durable key/value storage behind the session.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime class of a stored value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    /// Survives restarts.
    Persistent,
    /// Lives for one UI session and is dropped when the store is reopened.
    Tab,
}

impl StorageArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageArea::Persistent => "persistent",
            StorageArea::Tab => "tab",
        }
    }
}

/// Address of one stored value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub area: StorageArea,
    pub name: &'static str,
}

impl StoreKey {
    pub const fn persistent(name: &'static str) -> Self {
        Self {
            area: StorageArea::Persistent,
            name,
        }
    }

    pub const fn tab(name: &'static str) -> Self {
        Self {
            area: StorageArea::Tab,
            name,
        }
    }
}

impl core::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.area.as_str(), self.name)
    }
}

/// The persisted session layout.
pub mod keys {
    use super::StoreKey;

    pub const TOKEN: StoreKey = StoreKey::persistent("token");
    pub const SCOPE: StoreKey = StoreKey::persistent("scope");
    pub const REFRESH_TOKEN: StoreKey = StoreKey::persistent("refreshToken");
    pub const EXPIRED_AT: StoreKey = StoreKey::persistent("expiredAt");
    pub const REMEMBER_ME: StoreKey = StoreKey::persistent("rememberMe");

    /// Per-tab UI cache (open tabs of the admin console).
    pub const TABS: StoreKey = StoreKey::tab("tabs");

    /// Every key a session teardown removes, in one operation.
    pub const SESSION: [StoreKey; 6] = [TOKEN, SCOPE, REFRESH_TOKEN, EXPIRED_AT, REMEMBER_ME, TABS];
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable key/value persistence.
///
/// Multi-key writes and removals are all-or-nothing: a session teardown must
/// never leave half of the credentials behind.
#[async_trait]
pub trait DurableStore: Send + Sync + 'static {
    /// Retrieve a value.
    async fn get(&self, key: StoreKey) -> StoreResult<Option<String>>;

    /// Store every entry, atomically.
    async fn set_all(&self, entries: &[(StoreKey, String)]) -> StoreResult<()>;

    /// Remove every key, atomically. Missing keys are not an error.
    async fn remove_all(&self, keys: &[StoreKey]) -> StoreResult<()>;

    /// Store one value.
    async fn set(&self, key: StoreKey, value: &str) -> StoreResult<()> {
        self.set_all(&[(key, value.to_string())]).await
    }
}

/// In-process store.
///
/// Used for headless embedding and tests; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with what a previous run persisted.
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (StoreKey, String)>,
    {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> HashMap<StoreKey, String> {
        self.lock().clone()
    }

    /// Drop every tab-scoped value, as closing the UI session would.
    pub fn end_tab_session(&self) {
        self.lock().retain(|key, _| key.area != StorageArea::Tab);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<StoreKey, String>> {
        // Every mutation is a single map call; a poisoned map is still whole.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: StoreKey) -> StoreResult<Option<String>> {
        Ok(self.lock().get(&key).cloned())
    }

    async fn set_all(&self, entries: &[(StoreKey, String)]) -> StoreResult<()> {
        let mut map = self.lock();
        for (key, value) in entries {
            map.insert(*key, value.clone());
        }
        Ok(())
    }

    async fn remove_all(&self, keys: &[StoreKey]) -> StoreResult<()> {
        let mut map = self.lock();
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }
}
