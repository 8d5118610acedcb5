//! SQLite backend
//!
//! Stores every key as one row of `state_entries`.

use crate::state::durable::DurableStore;
use crate::state::error::PersistenceError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// Database-backed durable store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database and run migrations
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    ///
    /// # Returns
    /// * `Ok(SqliteStore)` if successful
    /// * `Err(PersistenceError)` if the directory, connection or migration failed
    pub async fn new(db_path: &str) -> Result<Self, PersistenceError> {
        // Ensure parent directory exists
        if let Some(parent) = PathBuf::from(db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        // SQLite connection string format: sqlite://path/to/db.db
        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!("Connected to SQLite state store at: {}", db_path);

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), PersistenceError> {
        let migration_sql = include_str!("../../migrations/001_create_state_entries.sql");

        // Remove comments (lines starting with --) and normalize whitespace
        let mut cleaned_sql = String::new();
        for line in migration_sql.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }
            let without_comments = match trimmed.find("--") {
                Some(comment_pos) => &trimmed[..comment_pos],
                None => trimmed,
            };
            cleaned_sql.push_str(without_comments.trim());
            cleaned_sql.push(' ');
        }

        for statement in cleaned_sql
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        debug!("State store migrations completed");
        Ok(())
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM state_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO state_entries (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM state_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.db");
        let store = SqliteStore::new(path.to_str().unwrap()).await.unwrap();

        assert_eq!(store.read("fission_results").await.unwrap(), None);
        store.write("fission_results", "1").await.unwrap();
        store.write("fission_results", "2").await.unwrap();
        assert_eq!(
            store.read("fission_results").await.unwrap().as_deref(),
            Some("2")
        );

        store.remove("fission_results").await.unwrap();
        assert_eq!(store.read("fission_results").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reopen_keeps_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.db");
        let path = path.to_str().unwrap();

        SqliteStore::new(path)
            .await
            .unwrap()
            .write("k", "\"v\"")
            .await
            .unwrap();

        let reopened = SqliteStore::new(path).await.unwrap();
        assert_eq!(reopened.read("k").await.unwrap().as_deref(), Some("\"v\""));
    }
}
