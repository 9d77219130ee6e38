//! Database connection pool abstraction
//!
//! The rest of the crate talks to `DatabasePool` and never to a concrete
//! sqlx pool. SQLite is the default single-binary deployment; MySQL is
//! for shared installs. Repositories branch on `driver()` and grab the
//! matching pool through `as_sqlite()`/`as_mysql()`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
};
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

const SQLITE_MAX_CONNECTIONS: u32 = 20;
const MYSQL_MAX_CONNECTIONS: u32 = 30;

/// Backend-neutral handle over the configured database
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run a statement that returns no rows; yields the affected row count
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Health check against the live connection
    async fn ping(&self) -> Result<()>;

    /// Drain and close the pool
    async fn close(&self);

    /// Which backend this pool talks to
    fn driver(&self) -> DatabaseDriver;

    /// The raw SQLite pool, when running on SQLite
    fn as_sqlite(&self) -> Option<&SqlitePool>;

    /// The raw MySQL pool, when running on MySQL
    fn as_mysql(&self) -> Option<&MySqlPool>;
}

/// Shared, cloneable pool handle
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Normalize a configured SQLite location into a sqlx connection URL.
///
/// Bare paths get the `sqlite:` scheme and `mode=rwc` so a first run can
/// create the file; URLs that already carry query parameters are trusted
/// as written.
fn sqlite_connection_url(url: &str) -> String {
    if url == ":memory:" || url == "sqlite::memory:" {
        return "sqlite::memory:".to_string();
    }
    if let Some(rest) = url.strip_prefix("sqlite:") {
        if rest.contains('?') {
            return url.to_string();
        }
        return format!("sqlite:{rest}?mode=rwc");
    }
    format!("sqlite:{url}?mode=rwc")
}

/// The filesystem path of a file-backed SQLite URL, if any
fn sqlite_file_path(url: &str) -> Option<&str> {
    if url.contains(":memory:") {
        return None;
    }
    Some(url.strip_prefix("sqlite:").unwrap_or(url))
}

/// SQLite-backed pool
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        // A first run may point at a directory that does not exist yet
        if let Some(path) = sqlite_file_path(url) {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {:?}", parent)
                    })?;
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_MAX_CONNECTIONS)
            .connect(&sqlite_connection_url(url))
            .await
            .with_context(|| format!("Failed to open SQLite database at '{}'", url))?;

        // FK enforcement is off by default in SQLite
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .context("Failed to enable foreign key enforcement")?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let done = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Statement failed: {}", query))?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("SQLite ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }
}

/// MySQL-backed pool
pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{url}")
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(MYSQL_MAX_CONNECTIONS)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to MySQL at '{}'", url))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let done = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Statement failed: {}", query))?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("MySQL ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }
}

/// Open the pool named by the configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    match config.driver {
        DatabaseDriver::Sqlite => Ok(Arc::new(SqliteDatabase::new(&config.url).await?)),
        DatabaseDriver::Mysql => Ok(Arc::new(MysqlDatabase::new(&config.url).await?)),
    }
}

/// In-memory SQLite pool for tests
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let config = DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_url_normalization() {
        assert_eq!(sqlite_connection_url(":memory:"), "sqlite::memory:");
        assert_eq!(sqlite_connection_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            sqlite_connection_url("data/relaypost.db"),
            "sqlite:data/relaypost.db?mode=rwc"
        );
        assert_eq!(
            sqlite_connection_url("sqlite:app.db"),
            "sqlite:app.db?mode=rwc"
        );
        // Explicit parameters are left alone
        assert_eq!(
            sqlite_connection_url("sqlite:app.db?mode=ro"),
            "sqlite:app.db?mode=ro"
        );
    }

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(sqlite_file_path(":memory:"), None);
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("sqlite:data/app.db"), Some("data/app.db"));
        assert_eq!(sqlite_file_path("data/app.db"), Some("data/app.db"));
    }

    #[tokio::test]
    async fn test_memory_pool_reports_sqlite() {
        let pool = create_test_pool().await.expect("pool");
        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(pool.as_sqlite().is_some());
        assert!(pool.as_mysql().is_none());
        pool.ping().await.expect("ping");
    }

    #[tokio::test]
    async fn test_execute_reports_affected_rows() {
        let pool = create_test_pool().await.expect("pool");

        pool.execute("CREATE TABLE probe (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("create table");
        let affected = pool
            .execute("INSERT INTO probe (name) VALUES ('x'), ('y')")
            .await
            .expect("insert");
        assert_eq!(affected, 2);
    }

    #[tokio::test]
    async fn test_file_pool_creates_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("nested").join("relaypost.db");

        let config = DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: db_path.to_string_lossy().to_string(),
        };

        let pool = create_pool(&config).await.expect("pool");
        pool.ping().await.expect("ping");
        assert!(db_path.exists());
    }

    #[tokio::test]
    #[ignore = "Requires a MySQL server; set MYSQL_TEST_URL"]
    async fn test_mysql_pool_creation() {
        let url = std::env::var("MYSQL_TEST_URL")
            .unwrap_or_else(|_| "mysql://root@localhost/test".to_string());

        let pool = create_pool(&DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url,
        })
        .await
        .expect("pool");
        assert_eq!(pool.driver(), DatabaseDriver::Mysql);
        assert!(pool.as_mysql().is_some());
    }
}
