//! SQLite adapters for the core persistence ports

mod columns;
pub mod item_repository;
pub mod manager;
pub mod mirror_store;
pub mod sales_history_repository;
pub mod token_repository;

pub use item_repository::SqliteItemRepository;
pub use manager::DbManager;
pub use mirror_store::SqliteMirrorStore;
pub use sales_history_repository::SqliteSalesHistoryRepository;
pub use token_repository::SqliteTokenRepository;
