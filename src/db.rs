//! Database connection and schema management for the persistence service.
//!
//! # Example
//!
//! ```no_run
//! use bookshelf_core::{Database, DatabaseOptions};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(Path::new("books.db"), &DatabaseOptions::default()).await?;
//! // Hand db to SqliteBookRepository::new...
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, instrument};

/// Default pool size; `SQLite` serializes writers, so a few readers suffice.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default wait before a locked database returns `SQLITE_BUSY`.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Database-related errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// Failed to connect to the database.
    #[error(
        "failed to open book database: {0}\n  Suggestion: Check that the database directory exists and is writable"
    )]
    Connection(#[from] sqlx::Error),

    /// Failed to create the schema.
    #[error("failed to create book schema: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Pool and locking settings for [`Database::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

/// `SQLite` connection pool with the books schema applied.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the book database at `path`.
    ///
    /// Every pooled connection runs in WAL mode with the configured busy
    /// timeout. The books schema is created on first start.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the connection fails,
    /// or `DbError::Migration` if the schema cannot be created.
    #[instrument(skip(path), fields(path = %path.display(), max_connections = options.max_connections))]
    pub async fn open(path: &Path, options: &DatabaseOptions) -> Result<Self, DbError> {
        let connect = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(options.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .connect_with(connect)
            .await?;

        Self::with_schema(pool).await
    }

    /// Creates an in-memory database for tests.
    ///
    /// Limited to one connection so every query sees the same database.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the connection fails,
    /// or `DbError::Migration` if the schema cannot be created.
    pub async fn new_in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;

        Self::with_schema(pool).await
    }

    async fn with_schema(pool: SqlitePool) -> Result<Self, DbError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!("Books schema ready");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes all connections in the pool.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_new_in_memory_succeeds() {
        let db = Database::new_in_memory().await;
        assert!(db.is_ok(), "Failed to create in-memory database");
    }

    #[tokio::test]
    async fn test_books_table_exists_after_migration() {
        let db = Database::new_in_memory().await.unwrap();

        let result = sqlx::query("INSERT INTO books (title, isbn) VALUES ('Sapiens', '9780143127741')")
            .execute(db.pool())
            .await;

        assert!(result.is_ok(), "books table should exist after migration");
    }

    #[tokio::test]
    async fn test_books_isbn_is_not_unique() {
        let db = Database::new_in_memory().await.unwrap();

        for _ in 0..2 {
            sqlx::query("INSERT INTO books (title, isbn) VALUES ('Sapiens', '9780143127741')")
                .execute(db.pool())
                .await
                .unwrap();
        }

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_books_title_is_required() {
        let db = Database::new_in_memory().await.unwrap();

        let result = sqlx::query("INSERT INTO books (isbn) VALUES ('9780143127741')")
            .execute(db.pool())
            .await;

        assert!(result.is_err(), "NULL title should be rejected");
    }

    #[tokio::test]
    async fn test_open_applies_wal_and_busy_timeout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("books.db");
        let options = DatabaseOptions {
            max_connections: 2,
            busy_timeout: Duration::from_millis(1234),
        };

        let db = Database::open(&db_path, &options).await.unwrap();

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert!(mode.eq_ignore_ascii_case("wal"));
        let (timeout,): (i64,) = sqlx::query_as("PRAGMA busy_timeout")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(timeout, 1234);
        db.close().await;
    }

    #[tokio::test]
    async fn test_open_respects_pool_size() {
        let temp_dir = tempfile::tempdir().unwrap();
        let options = DatabaseOptions {
            max_connections: 3,
            ..DatabaseOptions::default()
        };

        let db = Database::open(&temp_dir.path().join("books.db"), &options)
            .await
            .unwrap();

        assert_eq!(db.pool().options().get_max_connections(), 3);
        db.close().await;
    }

    #[test]
    fn test_default_options() {
        let options = DatabaseOptions::default();
        assert_eq!(options.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(options.busy_timeout, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS));
    }

    #[tokio::test]
    async fn test_database_reopen_keeps_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("books.db");

        let db = Database::open(&db_path, &DatabaseOptions::default())
            .await
            .unwrap();
        sqlx::query("INSERT INTO books (title, isbn) VALUES ('Sapiens', '9780143127741')")
            .execute(db.pool())
            .await
            .unwrap();
        db.close().await;

        let db = Database::open(&db_path, &DatabaseOptions::default())
            .await
            .unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
