//! SQLite-backed [`KeyValueStore`].
//!
//! One table, `kv_store(key PRIMARY KEY, value TEXT, updated_at TEXT)`; values
//! are JSON text. Writes are upserts, so a record is replaced as a whole.
use crate::{KeyValueStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key        TEXT PRIMARY KEY NOT NULL,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url`, e.g.
    /// `sqlite:///home/me/.local/share/proxykit/proxykit.db`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        if url.contains(":memory:") {
            return Self::in_memory().await;
        }
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        if let Some(parent) = opts.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database; one pinned connection keeps it alive.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let raw: String = row.try_get("value")?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&value)?;
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&raw)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        debug!(key, bytes = raw.len(), "store.set");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        debug!(key, removed = res.rows_affected(), "store.remove");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn upsert_replaces_whole_value() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.set("proxyConfig", json!({"a": 1, "b": 2})).await.unwrap();
        store.set("proxyConfig", json!({"a": 3})).await.unwrap();
        assert_eq!(store.get("proxyConfig").await.unwrap(), Some(json!({"a": 3})));
    }

    #[tokio::test]
    async fn remove_missing_key_is_ok() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.remove("nothing").await.unwrap();
        assert!(store.get("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", tmp.path().join("nested/kv.db").display());
        {
            let store = SqliteStore::connect(&url).await.unwrap();
            store.set("k", json!(["x"])).await.unwrap();
            store.pool().close().await;
        }
        let store = SqliteStore::connect(&url).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(["x"])));
    }
}
