//! SQLite-backed sales history (sales orders and their line items).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Row};
use suitelink_core::SalesHistoryRepository;
use suitelink_domain::{LineItem, Result as DomainResult, SalesOrderRef, SalesOrderRow};
use tokio::task;

use super::columns::{from_iso_date, to_iso_date, to_millis};
use super::manager::DbManager;
use crate::errors::{map_join_error, map_sql_error};

/// SQLite-backed sales history repository.
pub struct SqliteSalesHistoryRepository {
    db: Arc<DbManager>,
}

impl SqliteSalesHistoryRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or replace a sales order row.
    pub async fn record_sales_order(&self, order: &SalesOrderRow) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let order = order.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO sales_orders \
                 (id, zoho_salesorder_id, salesorder_number, customer_name, date, status, total, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(id) DO UPDATE SET \
                     zoho_salesorder_id = excluded.zoho_salesorder_id, \
                     salesorder_number = excluded.salesorder_number, \
                     customer_name = excluded.customer_name, \
                     date = excluded.date, \
                     status = excluded.status, \
                     total = excluded.total",
                params![
                    order.id,
                    order.zoho_salesorder_id,
                    order.salesorder_number,
                    order.customer_name,
                    to_iso_date(order.date),
                    order.status,
                    order.total,
                    to_millis(Utc::now()),
                ],
            )
            .map(|_| ())
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Insert or replace a line item row.
    pub async fn record_line_item(&self, line: &LineItem) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let line = line.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR REPLACE INTO line_items \
                 (id, parent_id, parent_type, item_id, sku, name, description, rate, quantity, item_total) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    line.id,
                    line.parent_id,
                    line.parent_type,
                    line.item_id,
                    line.sku,
                    line.name,
                    line.description,
                    line.rate,
                    line.quantity,
                    line.item_total,
                ],
            )
            .map(|_| ())
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl SalesHistoryRepository for SqliteSalesHistoryRepository {
    async fn find_sales_orders_since(&self, cutoff: NaiveDate) -> DomainResult<Vec<SalesOrderRef>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<SalesOrderRef>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare("SELECT id, date FROM sales_orders WHERE date >= ?1 ORDER BY date, id")
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![to_iso_date(cutoff)], map_order_ref)
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_line_items(
        &self,
        parent_ids: &[String],
        parent_type: &str,
    ) -> DomainResult<Vec<LineItem>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let db = Arc::clone(&self.db);
        let mut bind: Vec<String> = Vec::with_capacity(parent_ids.len() + 1);
        bind.push(parent_type.to_string());
        bind.extend(parent_ids.iter().cloned());

        task::spawn_blocking(move || -> DomainResult<Vec<LineItem>> {
            let conn = db.get_connection()?;
            let placeholders = vec!["?"; bind.len() - 1].join(", ");
            let sql = format!(
                "SELECT id, parent_id, parent_type, item_id, sku, name, description, rate, quantity, item_total \
                 FROM line_items WHERE parent_type = ? AND parent_id IN ({placeholders}) \
                 ORDER BY parent_id, id"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt.query_map(params_from_iter(bind.iter()), map_line_item).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_order_ref(row: &Row<'_>) -> rusqlite::Result<SalesOrderRef> {
    let date: String = row.get(1)?;
    Ok(SalesOrderRef { id: row.get(0)?, date: from_iso_date(1, &date)? })
}

fn map_line_item(row: &Row<'_>) -> rusqlite::Result<LineItem> {
    Ok(LineItem {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        parent_type: row.get(2)?,
        item_id: row.get(3)?,
        sku: row.get(4)?,
        name: row.get(5)?,
        description: row.get(6)?,
        rate: row.get(7)?,
        quantity: row.get(8)?,
        item_total: row.get(9)?,
    })
}
