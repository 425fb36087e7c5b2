//! SQLite store handle for biblio.
//!
//! The [`Db`] handle is constructed once at startup, passed explicitly to
//! modules, and closed at shutdown. There is no ambient global connection.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const MIGRATIONS_LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    module     TEXT NOT NULL,
    id         TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (module, id)
)";

/// Handle to the SQLite store. Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (creating if missing) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .with_context(|| "invalid database path")?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let db = Self::connect(opts).await?;
        tracing::info!(target: "biblio-db", path = %path.display(), "database opened");
        Ok(db)
    }

    /// Open an in-memory database. Intended for tests.
    pub async fn open_in_memory() -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .with_context(|| "invalid in-memory connection string")?
            .foreign_keys(true);

        Self::connect(opts).await
    }

    async fn connect(opts: SqliteConnectOptions) -> anyhow::Result<Self> {
        // SQLite permits limited write concurrency; a single pooled connection
        // avoids "database is locked" failures under concurrent requests. The
        // connection is pinned (no idle reaping) so an in-memory database
        // survives for the lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .with_context(|| "failed to connect to sqlite database")?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply one module migration if it has not been applied before.
    ///
    /// Applied migrations are recorded in the `_migrations` ledger table.
    /// Returns `true` when the migration ran in this call.
    pub async fn apply_migration(&self, module: &str, id: &str, up: &str) -> anyhow::Result<bool> {
        sqlx::query(MIGRATIONS_LEDGER_DDL)
            .execute(&self.pool)
            .await
            .with_context(|| "failed to ensure migrations ledger")?;

        let already_applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM _migrations WHERE module = ? AND id = ?)",
        )
        .bind(module)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .with_context(|| "failed to read migrations ledger")?;

        if already_applied {
            tracing::debug!(target: "biblio-db", module, id, "migration already applied");
            return Ok(false);
        }

        sqlx::raw_sql(up)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to apply migration '{}/{}'", module, id))?;

        sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| "failed to record migration")?;

        tracing::info!(target: "biblio-db", module, id, "migration applied");
        Ok(true)
    }

    /// Close the pool, flushing any pending work.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(target: "biblio-db", "database closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn apply_migration_is_idempotent() {
        let db = Db::open_in_memory().await.unwrap();

        let first = db
            .apply_migration("test", "001_init", "CREATE TABLE t (id INTEGER PRIMARY KEY);")
            .await
            .unwrap();
        let second = db
            .apply_migration("test", "001_init", "CREATE TABLE t (id INTEGER PRIMARY KEY);")
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn apply_migration_runs_multiple_statements() {
        let db = Db::open_in_memory().await.unwrap();

        db.apply_migration(
            "test",
            "001_init",
            "CREATE TABLE a (id INTEGER PRIMARY KEY);
             CREATE TABLE b (id INTEGER PRIMARY KEY);",
        )
        .await
        .unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('a', 'b')",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn malformed_migration_surfaces_error() {
        let db = Db::open_in_memory().await.unwrap();

        let result = db.apply_migration("test", "001_bad", "CREATE BOGUS;").await;
        assert!(result.is_err());
    }
}
