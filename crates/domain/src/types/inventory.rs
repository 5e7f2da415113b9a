//! Mirror rows for items and sales history

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_text_enum_conversions;

/// Sales order reference returned by the window query (id and date only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderRef {
    pub id: String,
    pub date: NaiveDate,
}

/// Full sales order mirror row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderRow {
    pub id: String,
    pub zoho_salesorder_id: Option<String>,
    pub salesorder_number: Option<String>,
    pub customer_name: Option<String>,
    pub date: NaiveDate,
    pub status: Option<String>,
    pub total: Option<f64>,
}

/// Line item mirror row attached to a parent document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub parent_id: String,
    pub parent_type: String,
    pub item_id: Option<String>,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub rate: Option<f64>,
    pub quantity: f64,
    pub item_total: Option<f64>,
}

/// Column an item upsert resolves conflicts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKey {
    Sku,
    ItemId,
}

impl_text_enum_conversions!(ConflictKey {
    Sku => "sku",
    ItemId => "zoho_item_id",
});

/// Item mirror row.
///
/// A row is addressable by `sku` when present, otherwise by `zoho_item_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    pub zoho_item_id: Option<String>,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub rate: Option<f64>,
    pub status: String,
    pub item_type: String,
    pub product_type: String,
    pub stock_on_hand: f64,
    pub reorder_level: Option<i64>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl ItemRecord {
    /// Preferred conflict key for this row, or `None` when it has neither.
    pub fn conflict_key(&self) -> Option<ConflictKey> {
        if non_empty(self.sku.as_deref()) {
            Some(ConflictKey::Sku)
        } else if non_empty(self.zoho_item_id.as_deref()) {
            Some(ConflictKey::ItemId)
        } else {
            None
        }
    }
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
