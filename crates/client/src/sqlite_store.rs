//! SQLite-backed durable store for the session.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use crate::storage::{DurableStore, StorageArea, StoreError, StoreKey, StoreResult};

/// SQLite-backed key/value store.
///
/// The database is opened lazily on first use. Opening it also drops every
/// row in [`StorageArea::Tab`]: tab-scoped values never outlive the UI
/// session that wrote them.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteStore {
    /// Store at an explicit database path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Store at `{app_data_dir}/blogdesk/session.db`.
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(session_db_path()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Initialize the database connection (called lazily on first use).
    async fn ensure_initialized(&self) -> anyhow::Result<SqlitePool> {
        let mut pool_guard = self.pool.lock().await;
        if let Some(pool) = pool_guard.as_ref() {
            return Ok(pool.clone());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create session store directory at {:?}", parent))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open session store at {:?}", self.path))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_kv (
                area       TEXT NOT NULL,
                key        TEXT NOT NULL,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (area, key)
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create session_kv table")?;

        let purged = sqlx::query("DELETE FROM session_kv WHERE area = ?1")
            .bind(StorageArea::Tab.as_str())
            .execute(&pool)
            .await
            .context("failed to purge tab-scoped values")?
            .rows_affected();

        tracing::debug!(path = ?self.path, purged, "session store opened");

        *pool_guard = Some(pool.clone());
        Ok(pool)
    }

    async fn get_inner(&self, key: StoreKey) -> anyhow::Result<Option<String>> {
        let pool = self.ensure_initialized().await?;

        let row = sqlx::query(
            r#"
            SELECT value
            FROM session_kv
            WHERE area = ?1
              AND key = ?2
            "#,
        )
        .bind(key.area.as_str())
        .bind(key.name)
        .fetch_optional(&pool)
        .await
        .with_context(|| format!("failed to read {key}"))?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set_all_inner(&self, entries: &[(StoreKey, String)]) -> anyhow::Result<()> {
        let pool = self.ensure_initialized().await?;
        let now = Utc::now().to_rfc3339();

        let mut tx = pool.begin().await.context("failed to begin transaction")?;
        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO session_kv (area, key, value, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(area, key)
                DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key.area.as_str())
            .bind(key.name)
            .bind(value)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to write {key}"))?;
        }
        tx.commit().await.context("failed to commit session write")?;

        Ok(())
    }

    async fn remove_all_inner(&self, keys: &[StoreKey]) -> anyhow::Result<()> {
        let pool = self.ensure_initialized().await?;

        let mut tx = pool.begin().await.context("failed to begin transaction")?;
        for key in keys {
            sqlx::query("DELETE FROM session_kv WHERE area = ?1 AND key = ?2")
                .bind(key.area.as_str())
                .bind(key.name)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to remove {key}"))?;
        }
        tx.commit().await.context("failed to commit session removal")?;

        Ok(())
    }
}

fn backend(err: anyhow::Error) -> StoreError {
    StoreError::Backend(format!("{err:#}"))
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn get(&self, key: StoreKey) -> StoreResult<Option<String>> {
        self.get_inner(key).await.map_err(backend)
    }

    async fn set_all(&self, entries: &[(StoreKey, String)]) -> StoreResult<()> {
        self.set_all_inner(entries).await.map_err(backend)
    }

    async fn remove_all(&self, keys: &[StoreKey]) -> StoreResult<()> {
        self.remove_all_inner(keys).await.map_err(backend)
    }
}

/// Resolve the path to the SQLite session database:
/// `{app_data_dir}/blogdesk/session.db`.
fn session_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut path = base;
    path.push("blogdesk");
    path.push("session.db");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::keys;

    fn temp_db() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("blogdesk-test-{}", uuid::Uuid::now_v7()));
        path.push("session.db");
        path
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let path = temp_db();

        let store = SqliteStore::new(&path);
        store
            .set_all(&[
                (keys::TOKEN, "t-1".to_string()),
                (keys::EXPIRED_AT, "1700000000".to_string()),
            ])
            .await
            .unwrap();
        drop(store);

        let reopened = SqliteStore::new(&path);
        assert_eq!(reopened.get(keys::TOKEN).await.unwrap().as_deref(), Some("t-1"));
        assert_eq!(
            reopened.get(keys::EXPIRED_AT).await.unwrap().as_deref(),
            Some("1700000000")
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn tab_values_do_not_survive_reopen() {
        let path = temp_db();

        let store = SqliteStore::new(&path);
        store.set(keys::TABS, "[\"admin\"]").await.unwrap();
        store.set(keys::SCOPE, "admin").await.unwrap();
        assert!(store.get(keys::TABS).await.unwrap().is_some());
        drop(store);

        let reopened = SqliteStore::new(&path);
        assert_eq!(reopened.get(keys::TABS).await.unwrap(), None);
        assert_eq!(reopened.get(keys::SCOPE).await.unwrap().as_deref(), Some("admin"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn remove_all_clears_every_key() {
        let path = temp_db();
        let store = SqliteStore::new(&path);

        let entries: Vec<(StoreKey, String)> = keys::SESSION
            .iter()
            .map(|k| (*k, format!("v-{}", k.name)))
            .collect();
        store.set_all(&entries).await.unwrap();

        store.remove_all(&keys::SESSION).await.unwrap();
        for key in keys::SESSION {
            assert_eq!(store.get(key).await.unwrap(), None, "{key} survived");
        }

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
