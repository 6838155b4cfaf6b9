use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use nn_core::{Error, KeyValueStore, Result};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;

use crate::StorageBackend;

const DEFAULT_PATH: &str = "news_neutralizer.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS kv (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

pub struct SqliteStore {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SqliteStore {
    fn get_error_message() -> &'static str {
        "SQLite database should be writable at ./news_neutralizer.db"
    }

    async fn open(location: Option<&str>) -> Result<Self> {
        let db_path = PathBuf::from(location.unwrap_or(DEFAULT_PATH));
        Self::new_with_path(&db_path).await
    }
}

impl SqliteStore {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", key, e)))?;

        match row {
            Some(row) => {
                let raw: String = row.get("value");
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value.to_string())
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", key, e)))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to delete {}: {}", key, e)))?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to list keys: {}", e)))?;
        Ok(rows.into_iter().map(|row| row.get::<String, _>("key")).collect())
    }

    async fn bytes_in_use(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COALESCE(SUM(LENGTH(key) + LENGTH(value)), 0) AS total FROM kv")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to measure storage: {}", e)))?;
        let total: i64 = row.get("total");
        Ok(total.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sqlite_store_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("kv.db");
        let store = SqliteStore::new_with_path(&path).await.unwrap();
        assert_eq!(store.get_db_path(), path.as_path());

        store.set("a", json!({"x": [1, 2]})).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"x": [1, 2]})));

        store.set("a", json!("replaced")).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!("replaced")));
        assert_eq!(store.keys().await.unwrap(), vec!["a".to_string()]);
        assert!(store.bytes_in_use().await.unwrap() > 0);

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_across_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kv.db");
        {
            let store = SqliteStore::new_with_path(&path).await.unwrap();
            store.set("history", json!([1])).await.unwrap();
        }
        let store = SqliteStore::open(path.to_str()).await.unwrap();
        assert_eq!(store.get("history").await.unwrap(), Some(json!([1])));
    }
}
