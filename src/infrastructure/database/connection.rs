//! Database connection pool manager.
//!
//! Manages a `SQLite` connection pool with WAL mode enabled for better
//! concurrency. Handles connection lifecycle, migrations, and
//! configuration.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};

use super::errors::DatabaseError;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Creates a new connection pool with WAL mode, foreign keys enabled,
    /// and a busy timeout to ride out writer contention from concurrent
    /// workers.
    pub async fn new(database_url: &str) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| DatabaseError::ConnectionPoolError(format!("invalid database URL: {e}")))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(10)
            .idle_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionPoolError(format!("failed to create connection pool: {e}")))?;

        Ok(Self { pool })
    }

    /// Runs all pending migrations from `./migrations`. Safe to call
    /// multiple times.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        Ok(())
    }

    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connection_pool_creation() {
        let db = DatabaseConnection::new("sqlite::memory:").await.expect("failed to create connection");
        assert!(!db.pool().is_closed());
        db.close().await;
    }

    #[tokio::test]
    async fn migration_creates_core_tables() {
        let db = DatabaseConnection::new("sqlite::memory:").await.expect("failed to create connection");
        db.migrate().await.expect("failed to run migrations");

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .expect("failed to query tables");

        let names: Vec<String> = tables.into_iter().map(|t| t.0).collect();
        for expected in ["job", "task", "image", "image_variant", "image_tag", "image_description", "image_embedding", "image_color"] {
            assert!(names.contains(&expected.to_string()), "missing table {expected}, have {names:?}");
        }
        db.close().await;
    }

    #[tokio::test]
    async fn foreign_keys_are_enabled() {
        let db = DatabaseConnection::new("sqlite::memory:").await.expect("failed to create connection");
        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys").fetch_one(db.pool()).await.expect("pragma query failed");
        assert_eq!(result.0, 1);
        db.close().await;
    }
}
