//! SQLite-backed mirror of vendor entities.
//!
//! Items and sales orders land in the typed tables the reorder job reads.
//! A sales order's nested lines replace its rows in `line_items`. Every other
//! entity kind is kept as a JSON payload in `mirror_records`, keyed by
//! `(entity, record_key)`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, TransactionBehavior};
use serde_json::{Map, Value};
use suitelink_core::mapping::catalog::EntityKind;
use suitelink_core::sync::NESTED_LINE_ITEMS;
use suitelink_core::MirrorStore;
use suitelink_domain::constants::PARENT_TYPE_SALES_ORDER;
use suitelink_domain::{Result as DomainResult, SuiteLinkError};
use tokio::task;
use tracing::{debug, warn};
use uuid::Uuid;

use super::columns::to_millis;
use super::manager::DbManager;
use crate::errors::{map_join_error, map_sql_error};

/// Columns of `items` a synced record may write.
const ITEM_SYNC_COLUMNS: &[&str] = &[
    "zoho_item_id",
    "sku",
    "name",
    "description",
    "rate",
    "purchase_rate",
    "unit",
    "status",
    "item_type",
    "product_type",
    "stock_on_hand",
    "reorder_level",
    "zoho_created_at",
    "zoho_updated_at",
];

/// SQLite-backed mirror store.
pub struct SqliteMirrorStore {
    db: Arc<DbManager>,
}

impl SqliteMirrorStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn upsert_items(conn: &mut Connection, key_column: &str, rows: &[Map<String, Value>]) -> DomainResult<usize> {
        if !matches!(key_column, "zoho_item_id" | "sku") {
            return Err(SuiteLinkError::InvalidInput(format!(
                "{key_column} is not a unique column of the items table"
            )));
        }

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;
        let now = to_millis(Utc::now());
        let mut stored = 0;

        for row in rows {
            let present: Vec<(&str, SqlValue)> = ITEM_SYNC_COLUMNS
                .iter()
                .filter_map(|column| {
                    row.get(*column)
                        .filter(|value| !value.is_null())
                        .map(|value| (*column, sql_value(value)))
                })
                .collect();
            if !present.iter().any(|(column, _)| *column == key_column) {
                warn!(key_column, "synced item carries no key value, skipping");
                continue;
            }

            let columns: Vec<&str> = present.iter().map(|(column, _)| *column).collect();
            let updates = columns
                .iter()
                .filter(|column| **column != key_column)
                .map(|column| format!("{column} = excluded.{column}"))
                .chain(["last_synced_at = excluded.last_synced_at".to_string()])
                .chain(["updated_at = excluded.updated_at".to_string()])
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = vec!["?"; columns.len() + 4].join(", ");
            let sql = format!(
                "INSERT INTO items (id, {}, last_synced_at, created_at, updated_at) VALUES ({placeholders}) \
                 ON CONFLICT({key_column}) DO UPDATE SET {updates}",
                columns.join(", ")
            );

            let mut values = Vec::with_capacity(columns.len() + 4);
            values.push(SqlValue::Text(Uuid::now_v7().to_string()));
            values.extend(present.into_iter().map(|(_, value)| value));
            values.extend([SqlValue::Integer(now), SqlValue::Integer(now), SqlValue::Integer(now)]);

            tx.execute(&sql, params_from_iter(values)).map_err(map_sql_error)?;
            stored += 1;
        }

        tx.commit().map_err(map_sql_error)?;
        Ok(stored)
    }

    fn upsert_sales_orders(
        conn: &mut Connection,
        key_column: &str,
        rows: &[Map<String, Value>],
    ) -> DomainResult<usize> {
        if key_column != "zoho_salesorder_id" {
            return Err(SuiteLinkError::InvalidInput(format!(
                "{key_column} is not a unique column of the sales_orders table"
            )));
        }

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;
        let now = to_millis(Utc::now());
        let mut stored = 0;

        for row in rows {
            let Some(key) = row.get(key_column).and_then(record_key) else {
                warn!("synced sales order carries no key value, skipping");
                continue;
            };
            let Some(date) = row.get("date").and_then(Value::as_str) else {
                warn!(order = %key, "synced sales order carries no date, skipping");
                continue;
            };

            // The local id of an order already mirrored is kept.
            let order_id: String = tx
                .query_row(
                    "INSERT INTO sales_orders \
                     (id, zoho_salesorder_id, salesorder_number, customer_name, date, status, total, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                     ON CONFLICT(zoho_salesorder_id) DO UPDATE SET \
                         salesorder_number = COALESCE(excluded.salesorder_number, salesorder_number), \
                         customer_name = COALESCE(excluded.customer_name, customer_name), \
                         date = excluded.date, \
                         status = COALESCE(excluded.status, status), \
                         total = COALESCE(excluded.total, total) \
                     RETURNING id",
                    params![
                        Uuid::new_v4().to_string(),
                        key,
                        column(row, "salesorder_number"),
                        column(row, "customer_name"),
                        date,
                        column(row, "status"),
                        column(row, "total"),
                        now,
                    ],
                    |r| r.get(0),
                )
                .map_err(map_sql_error)?;

            if let Some(Value::Array(lines)) = row.get(NESTED_LINE_ITEMS) {
                Self::replace_line_items(&tx, &order_id, lines)?;
            }
            stored += 1;
        }

        tx.commit().map_err(map_sql_error)?;
        Ok(stored)
    }

    fn replace_line_items(conn: &Connection, order_id: &str, lines: &[Value]) -> DomainResult<()> {
        conn.execute(
            "DELETE FROM line_items WHERE parent_type = ?1 AND parent_id = ?2",
            params![PARENT_TYPE_SALES_ORDER, order_id],
        )
        .map_err(map_sql_error)?;

        for line in lines.iter().filter_map(Value::as_object) {
            let Some(quantity) = line.get("quantity").and_then(Value::as_f64) else {
                continue;
            };
            conn.execute(
                "INSERT INTO line_items \
                 (id, parent_id, parent_type, item_id, sku, name, description, rate, quantity, item_total) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    Uuid::new_v4().to_string(),
                    order_id,
                    PARENT_TYPE_SALES_ORDER,
                    column(line, "item_id"),
                    column(line, "sku"),
                    column(line, "name"),
                    column(line, "description"),
                    column(line, "rate"),
                    quantity,
                    column(line, "item_total"),
                ],
            )
            .map_err(map_sql_error)?;
        }
        Ok(())
    }

    fn upsert_mirror(
        conn: &mut Connection,
        entity: &str,
        key_column: &str,
        rows: &[Map<String, Value>],
    ) -> DomainResult<usize> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;
        let now = to_millis(Utc::now());
        let mut stored = 0;

        for row in rows {
            let Some(key) = row.get(key_column).and_then(record_key) else {
                warn!(entity, key_column, "mirror record carries no key value, skipping");
                continue;
            };
            let payload = serde_json::to_string(row)
                .map_err(|err| SuiteLinkError::Internal(format!("record not serializable: {err}")))?;
            tx.execute(
                "INSERT INTO mirror_records (entity, record_key, payload, synced_at) VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(entity, record_key) DO UPDATE SET payload = excluded.payload, synced_at = excluded.synced_at",
                params![entity, key, payload, now],
            )
            .map_err(map_sql_error)?;
            stored += 1;
        }

        tx.commit().map_err(map_sql_error)?;
        Ok(stored)
    }

    /// Payload stored for one mirrored record, if any.
    pub async fn find_record(&self, kind: EntityKind, record_key: &str) -> DomainResult<Option<Value>> {
        let db = Arc::clone(&self.db);
        let record_key = record_key.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<Value>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare("SELECT payload FROM mirror_records WHERE entity = ?1 AND record_key = ?2")
                .map_err(map_sql_error)?;
            let mut rows = stmt.query(params![kind.as_str(), record_key]).map_err(map_sql_error)?;
            let Some(row) = rows.next().map_err(map_sql_error)? else {
                return Ok(None);
            };
            let payload: String = row.get(0).map_err(map_sql_error)?;
            serde_json::from_str(&payload)
                .map(Some)
                .map_err(|err| SuiteLinkError::Database(format!("corrupt mirror payload: {err}")))
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl MirrorStore for SqliteMirrorStore {
    async fn upsert_records(
        &self,
        kind: EntityKind,
        key_column: &str,
        rows: &[Map<String, Value>],
    ) -> DomainResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let db = Arc::clone(&self.db);
        let key_column = key_column.to_string();
        let rows = rows.to_vec();

        let stored = task::spawn_blocking(move || -> DomainResult<usize> {
            let mut conn = db.get_connection()?;
            match kind.mirror_table() {
                "items" => Self::upsert_items(&mut conn, &key_column, &rows),
                "sales_orders" => Self::upsert_sales_orders(&mut conn, &key_column, &rows),
                _ => Self::upsert_mirror(&mut conn, kind.as_str(), &key_column, &rows),
            }
        })
        .await
        .map_err(map_join_error)??;

        debug!(entity = kind.as_str(), stored, "mirror rows upserted");
        Ok(stored)
    }
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => number
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| number.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(text) => SqlValue::Text(text.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn column(row: &Map<String, Value>, name: &str) -> SqlValue {
    row.get(name).map_or(SqlValue::Null, sql_value)
}

fn record_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
