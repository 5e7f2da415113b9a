//! # SuiteLink Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for token, item, sales-history and mirror stores
//! - The token lifecycle service ([`AuthManager`])
//! - The declarative entity mapping framework ([`EntityMapper`])
//! - The reorder-level batch job ([`ReorderLevelEngine`])
//! - Entity mirroring ([`EntitySyncService`])
//!
//! ## Architecture Principles
//! - Only depends on `suitelink-common` and `suitelink-domain`
//! - No database or HTTP code
//! - All external dependencies via traits

pub mod auth;
pub mod gateway;
pub mod mapping;
pub mod reorder;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use auth::ports::TokenRepository;
pub use auth::AuthManager;
pub use gateway::cache::{CachedToken, InMemoryTokenCache, TokenCache};
pub use gateway::ports::VendorApi;
pub use mapping::catalog::EntityKind;
pub use mapping::{EntityMapper, EntitySchema, FieldRule, RecordValidation, SchemaError};
pub use reorder::ports::{ItemRepository, SalesHistoryRepository};
pub use reorder::ReorderLevelEngine;
pub use sync::ports::MirrorStore;
pub use sync::EntitySyncService;
