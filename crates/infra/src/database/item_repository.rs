//! SQLite-backed item mirror.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use suitelink_core::ItemRepository;
use suitelink_domain::{ConflictKey, ItemRecord, Result as DomainResult};
use tokio::task;

use super::columns::{opt_from_millis, to_millis};
use super::manager::DbManager;
use crate::errors::{map_join_error, map_sql_error};

const ITEM_COLUMNS: &str = "id, zoho_item_id, sku, name, description, rate, status, item_type, \
                            product_type, stock_on_hand, reorder_level, last_synced_at";

/// SQLite-backed item repository.
pub struct SqliteItemRepository {
    db: Arc<DbManager>,
}

impl SqliteItemRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn find_by(conn: &Connection, column: ConflictKey, value: &str) -> rusqlite::Result<Option<ItemRecord>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE {} = ?1", column.as_str());
        conn.query_row(&sql, params![value], map_item_row).optional()
    }

    fn upsert(conn: &Connection, record: &ItemRecord, key: ConflictKey) -> rusqlite::Result<ItemRecord> {
        // The conflict target is one of two fixed column names, never user input.
        let sql = format!(
            "INSERT INTO items \
             (id, zoho_item_id, sku, name, description, rate, status, item_type, product_type, \
              stock_on_hand, reorder_level, last_synced_at, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13) \
             ON CONFLICT({key}) DO UPDATE SET \
                 zoho_item_id = COALESCE(excluded.zoho_item_id, items.zoho_item_id), \
                 sku = COALESCE(excluded.sku, items.sku), \
                 name = excluded.name, \
                 description = excluded.description, \
                 rate = excluded.rate, \
                 status = excluded.status, \
                 item_type = excluded.item_type, \
                 product_type = excluded.product_type, \
                 stock_on_hand = excluded.stock_on_hand, \
                 reorder_level = excluded.reorder_level, \
                 last_synced_at = excluded.last_synced_at, \
                 updated_at = excluded.updated_at \
             RETURNING {ITEM_COLUMNS}",
            key = key.as_str()
        );

        conn.query_row(
            &sql,
            params![
                record.id,
                record.zoho_item_id,
                record.sku,
                record.name,
                record.description,
                record.rate,
                record.status,
                record.item_type,
                record.product_type,
                record.stock_on_hand,
                record.reorder_level,
                record.last_synced_at.map(to_millis),
                to_millis(Utc::now()),
            ],
            map_item_row,
        )
    }

    async fn find(&self, column: ConflictKey, value: &str) -> DomainResult<Option<ItemRecord>> {
        let db = Arc::clone(&self.db);
        let value = value.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<ItemRecord>> {
            let conn = db.get_connection()?;
            Self::find_by(&conn, column, &value).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl ItemRepository for SqliteItemRepository {
    async fn find_by_sku(&self, sku: &str) -> DomainResult<Option<ItemRecord>> {
        self.find(ConflictKey::Sku, sku).await
    }

    async fn find_by_item_id(&self, item_id: &str) -> DomainResult<Option<ItemRecord>> {
        self.find(ConflictKey::ItemId, item_id).await
    }

    async fn upsert_item(&self, record: &ItemRecord, key: ConflictKey) -> DomainResult<ItemRecord> {
        let db = Arc::clone(&self.db);
        let record = record.clone();

        task::spawn_blocking(move || -> DomainResult<ItemRecord> {
            let conn = db.get_connection()?;
            Self::upsert(&conn, &record, key).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_item_row(row: &Row<'_>) -> rusqlite::Result<ItemRecord> {
    Ok(ItemRecord {
        id: row.get(0)?,
        zoho_item_id: row.get(1)?,
        sku: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        rate: row.get(5)?,
        status: row.get(6)?,
        item_type: row.get(7)?,
        product_type: row.get(8)?,
        stock_on_hand: row.get(9)?,
        reorder_level: row.get(10)?,
        last_synced_at: opt_from_millis(11, row.get(11)?)?,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::*;

    fn setup() -> (TempDir, SqliteItemRepository) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db = Arc::new(DbManager::new(temp_dir.path().join("items.db"), 2).unwrap());
        db.run_migrations().unwrap();
        (temp_dir, SqliteItemRepository::new(db))
    }

    fn item(sku: Option<&str>, item_id: Option<&str>, level: i64) -> ItemRecord {
        ItemRecord {
            id: Uuid::now_v7().to_string(),
            zoho_item_id: item_id.map(str::to_string),
            sku: sku.map(str::to_string),
            name: Some("Widget".into()),
            description: None,
            rate: Some(12.5),
            status: "active".into(),
            item_type: "inventory".into(),
            product_type: "goods".into(),
            stock_on_hand: 4.0,
            reorder_level: Some(level),
            last_synced_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn upsert_on_sku_keeps_row_id() {
        let (_dir, repo) = setup();
        let first = repo.upsert_item(&item(Some("W-1"), None, 2), ConflictKey::Sku).await.unwrap();
        let second = repo.upsert_item(&item(Some("W-1"), Some("99"), 5), ConflictKey::Sku).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.reorder_level, Some(5));
        assert_eq!(second.zoho_item_id.as_deref(), Some("99"));

        let found = repo.find_by_item_id("99").await.unwrap().unwrap();
        assert_eq!(found.sku.as_deref(), Some("W-1"));
    }

    #[tokio::test]
    async fn upsert_on_item_id_without_sku() {
        let (_dir, repo) = setup();
        repo.upsert_item(&item(None, Some("7"), 1), ConflictKey::ItemId).await.unwrap();
        let updated = repo.upsert_item(&item(None, Some("7"), 3), ConflictKey::ItemId).await.unwrap();

        assert_eq!(updated.reorder_level, Some(3));
        assert!(repo.find_by_sku("7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_rows_are_none() {
        let (_dir, repo) = setup();
        assert!(repo.find_by_sku("nope").await.unwrap().is_none());
    }
}
