//! Database connection manager backed by the shared SQLite pool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::params;
use suitelink_common::storage::{PooledSqlite, SqlitePool, SqlitePoolConfig};
use suitelink_domain::{DatabaseConfig, Result};
use tracing::info;

use crate::errors::{map_sql_error, map_storage_error};

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlitePool`].
pub struct DbManager {
    pool: SqlitePool,
    path: PathBuf,
}

impl DbManager {
    /// Open (or create) the database file with the given pool size.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        Self::with_pool_config(
            db_path,
            SqlitePoolConfig { max_size: pool_size.max(1), ..SqlitePoolConfig::default() },
        )
    }

    /// Open the database described by the `database` configuration section.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::with_pool_config(
            &config.path,
            SqlitePoolConfig {
                max_size: config.pool_size.max(1),
                busy_timeout: Duration::from_millis(config.busy_timeout_ms),
                ..SqlitePoolConfig::default()
            },
        )
    }

    fn with_pool_config<P: AsRef<Path>>(db_path: P, config: SqlitePoolConfig) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let pool = SqlitePool::new(&path, config).map_err(map_storage_error)?;

        info!(
            db_path = %path.display(),
            max_connections = pool.config().max_size,
            "sqlite pool initialised"
        );

        Ok(Self { pool, path })
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<PooledSqlite> {
        self.pool.get().map_err(map_storage_error)
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, CAST(strftime('%s','now') AS INTEGER) * 1000)",
            params![SCHEMA_VERSION],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify a pooled connection answers a trivial query.
    pub fn health_check(&self) -> Result<()> {
        self.pool.health_check().map_err(map_storage_error)
    }
}
