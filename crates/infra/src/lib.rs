//! # SuiteLink Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories (token store, items, sales history, entity mirror)
//! - The retrying HTTP client and the rate-limited vendor API gateway
//! - Configuration loading and tracing initialisation
//!
//! ## Architecture
//! - Implements traits defined in `suitelink-core`
//! - Contains all "impure" code (I/O, network, filesystem)

pub mod config;
pub mod database;
pub mod errors;
pub mod gateway;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use database::{
    DbManager, SqliteItemRepository, SqliteMirrorStore, SqliteSalesHistoryRepository,
    SqliteTokenRepository,
};
pub use errors::InfraError;
pub use gateway::{ApiGateway, GatewayResponse, RequestOptions};
pub use http::HttpClient;
pub use observability::init_tracing;
