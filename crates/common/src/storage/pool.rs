//! SQLite connection pool
//!
//! Provides r2d2-based connection pooling with per-connection pragmas.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use super::error::{StorageError, StorageResult};

/// Connection checked out of a [`SqlitePool`]
pub type PooledSqlite = PooledConnection<SqliteConnectionManager>;

/// Apply connection-level pragmas
///
/// These pragmas are applied to each connection in the pool:
/// - WAL mode for better concurrency
/// - NORMAL synchronous mode
/// - Foreign key constraints
/// - Busy timeout for handling lock contention
pub fn apply_connection_pragmas(conn: &Connection, config: &SqlitePoolConfig) -> StorageResult<()> {
    let mut pragma_sql = String::new();

    if config.enable_wal {
        pragma_sql.push_str("PRAGMA journal_mode=WAL;\n");
        pragma_sql.push_str("PRAGMA wal_autocheckpoint=1000;\n");
    }

    pragma_sql.push_str("PRAGMA synchronous=NORMAL;\n");

    if config.enable_foreign_keys {
        pragma_sql.push_str("PRAGMA foreign_keys=ON;\n");
    }

    conn.execute_batch(&pragma_sql)
        .map_err(|e| StorageError::Query(format!("Failed to apply pragmas: {e}")))?;

    conn.busy_timeout(config.busy_timeout)
        .map_err(|e| StorageError::Query(format!("Failed to set busy timeout: {e}")))?;

    Ok(())
}

/// SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
}

impl SqlitePool {
    /// Create a new pool for the database file at `path`
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, the file can't be
    /// opened, or a test connection cannot be checked out.
    #[instrument(fields(db_path = ?path, pool_size = config.max_size))]
    pub fn new(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        config.validate().map_err(StorageError::InvalidConfig)?;
        info!("Creating SQLite connection pool");

        let pragma_config = config.clone();
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            apply_connection_pragmas(conn, &pragma_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!(error = %e, "Failed to create connection pool");
                StorageError::Connection(format!("Failed to create pool: {e}"))
            })?;

        info!(max_size = config.max_size, "SQLite pool created");
        Ok(Self { pool, config })
    }

    /// Check out a connection
    ///
    /// # Errors
    /// Returns `StorageError::Timeout` when no connection frees up within the
    /// configured connection timeout.
    pub fn get(&self) -> StorageResult<PooledSqlite> {
        self.pool.get().map_err(|e| {
            warn!(error = %e, "Failed to acquire pooled connection");
            StorageError::Timeout(self.config.connection_timeout.as_secs())
        })
    }

    /// Run `SELECT 1` on a pooled connection
    ///
    /// # Errors
    /// Returns an error if a connection cannot be acquired or the query fails.
    pub fn health_check(&self) -> StorageResult<()> {
        let conn = self.get()?;
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
        debug!(result = one, "health check passed");
        Ok(())
    }

    /// Pool configuration
    pub const fn config(&self) -> &SqlitePoolConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_apply_pragmas() {
        let temp_dir = TempDir::new().unwrap();
        let conn = Connection::open(temp_dir.path().join("test.db")).unwrap();

        apply_connection_pragmas(&conn, &SqlitePoolConfig::default()).unwrap();

        let journal_mode: String =
            conn.pragma_query_value(None, "journal_mode", |row| row.get(0)).unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
        let foreign_keys: i64 =
            conn.pragma_query_value(None, "foreign_keys", |row| row.get(0)).unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn test_pool_hands_out_connections() {
        let temp_dir = TempDir::new().unwrap();
        let pool = SqlitePool::new(
            &temp_dir.path().join("pool.db"),
            SqlitePoolConfig { max_size: 2, ..SqlitePoolConfig::default() },
        )
        .unwrap();

        pool.health_check().unwrap();
        let first = pool.get().unwrap();
        let second = pool.get().unwrap();
        drop((first, second));
        assert_eq!(pool.config().max_size, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let err = SqlitePool::new(
            &temp_dir.path().join("bad.db"),
            SqlitePoolConfig { max_size: 0, ..SqlitePoolConfig::default() },
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfig(_)));
    }
}
