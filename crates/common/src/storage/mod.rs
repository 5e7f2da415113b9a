//! SQLite storage primitives
//!
//! Generic r2d2-backed connection pooling shared by the persistence adapters.
//! Schema management belongs to the application layer.

pub mod config;
pub mod error;
pub mod pool;

// Re-export commonly used types
pub use config::SqlitePoolConfig;
pub use error::{StorageError, StorageResult};
pub use pool::{apply_connection_pragmas, PooledSqlite, SqlitePool};
