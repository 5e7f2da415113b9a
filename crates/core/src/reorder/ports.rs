//! Port interfaces for the reorder job

use async_trait::async_trait;
use chrono::NaiveDate;
use suitelink_domain::{ConflictKey, ItemRecord, LineItem, Result, SalesOrderRef};

/// Read access to the mirrored sales history
#[async_trait]
pub trait SalesHistoryRepository: Send + Sync {
    /// Sales orders dated on or after `cutoff` (id and date only)
    async fn find_sales_orders_since(&self, cutoff: NaiveDate) -> Result<Vec<SalesOrderRef>>;

    /// Line items whose parent is one of `parent_ids` with the given parent tag
    async fn find_line_items(&self, parent_ids: &[String], parent_type: &str)
        -> Result<Vec<LineItem>>;
}

/// Item mirror table
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<ItemRecord>>;

    async fn find_by_item_id(&self, item_id: &str) -> Result<Option<ItemRecord>>;

    /// Insert or update `record`, resolving conflicts on `key`
    async fn upsert_item(&self, record: &ItemRecord, key: ConflictKey) -> Result<ItemRecord>;
}
