//! Database (db) handle.
use std::path::Path;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub const DEFAULT_DATABASE_PATH: &str = "keyhold.db";
pub const DEFAULT_POOL_SIZE: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Custom db structure to pass to Axum.
///
/// Cloning only clones the pool handle.
#[derive(Clone, Debug)]
pub struct Database {
    pub sqlite: SqlitePool,
}

impl Database {
    /// Open (or create) the database file and bring the schema up.
    pub async fn new(path: &Path, pool: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let sqlite = SqlitePoolOptions::new()
            .max_connections(pool.max(1))
            .connect_with(options)
            .await?;

        tracing::info!(path = %path.display(), "sqlite connected");

        let db = Self { sqlite };
        db.migrate().await?;
        Ok(db)
    }

    /// Private in-memory database.
    ///
    /// A single connection that never expires, otherwise each connection
    /// would see its own empty database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let sqlite = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { sqlite };
        db.migrate().await?;
        Ok(db)
    }

    /// Create tables if they do not exist yet.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!().run(&self.sqlite).await?;
        Ok(())
    }

    /// Wait for in-flight queries then release every connection.
    pub async fn close(&self) {
        self.sqlite.close().await;
        tracing::info!("sqlite connections closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'accounts'",
        )
        .fetch_one(&db.sqlite)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_close() {
        let db = Database::in_memory().await.unwrap();
        db.close().await;

        assert!(db.sqlite.is_closed());
        assert!(
            sqlx::query("SELECT 1")
                .execute(&db.sqlite)
                .await
                .is_err()
        );
    }
}
