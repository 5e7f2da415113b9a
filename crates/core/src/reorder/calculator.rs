//! Pure reorder-level arithmetic: outlier filtering, aggregation, the level
//! formula and item row merging.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use suitelink_domain::constants::{DEFAULT_ITEM_STATUS, DEFAULT_ITEM_TYPE, DEFAULT_PRODUCT_TYPE};
use suitelink_domain::{ItemRecord, LineItem, LineItemAggregate, ReorderParams};
use uuid::Uuid;

/// Result of the reorder-level formula for one aggregate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReorderLevel {
    pub daily_average: f64,
    pub expected_sales: f64,
    pub level: i64,
}

/// Keep line items whose quantity is at most `threshold`
pub fn filter_outliers(lines: Vec<LineItem>, threshold: f64) -> Vec<LineItem> {
    lines.into_iter().filter(|line| line.quantity <= threshold).collect()
}

/// Group line items by SKU, falling back to the vendor item id.
///
/// Aggregates keep first-seen order. A line with neither key becomes an
/// aggregate of its own so the caller can report it.
pub fn aggregate(lines: &[LineItem]) -> Vec<LineItemAggregate> {
    let mut aggregates: Vec<LineItemAggregate> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for line in lines {
        let index = match group_key(line) {
            Some(key) => *positions.entry(key).or_insert_with(|| {
                aggregates.push(LineItemAggregate::default());
                aggregates.len() - 1
            }),
            None => {
                aggregates.push(LineItemAggregate::default());
                aggregates.len() - 1
            }
        };

        let entry = &mut aggregates[index];
        entry.total_quantity += line.quantity;
        entry.total_amount += line
            .item_total
            .unwrap_or_else(|| line.rate.unwrap_or(0.0) * line.quantity);
        entry.line_count += 1;
        fill(&mut entry.sku, line.sku.as_deref());
        fill(&mut entry.item_id, line.item_id.as_deref());
        fill(&mut entry.name, line.name.as_deref());
        fill(&mut entry.description, line.description.as_deref());
        if entry.rate.is_none() {
            entry.rate = line.rate;
        }
    }

    aggregates
}

/// `expected = quantity / look_back * turnover`; below `floor` the level is 1,
/// otherwise the expected sales rounded half away from zero.
#[allow(clippy::cast_possible_truncation)]
pub fn reorder_level(total_quantity: f64, params: &ReorderParams, floor: f64) -> ReorderLevel {
    let daily_average = total_quantity / params.look_back_days;
    let expected_sales = daily_average * params.inventory_turnover_days;
    let level = if expected_sales < floor { 1 } else { expected_sales.round() as i64 };
    ReorderLevel { daily_average, expected_sales, level }
}

/// Build the row to upsert for `aggregate`.
///
/// With an existing row, non-empty incoming fields overwrite and absent ones
/// keep the stored value. The reorder level is always replaced. A row that
/// would end up nameless is named after its SKU or item id.
pub fn merge_item(
    existing: Option<&ItemRecord>,
    aggregate: &LineItemAggregate,
    level: i64,
    now: DateTime<Utc>,
) -> ItemRecord {
    let base = existing.cloned().unwrap_or_else(|| ItemRecord {
        id: Uuid::now_v7().to_string(),
        zoho_item_id: None,
        sku: None,
        name: None,
        description: None,
        rate: None,
        status: DEFAULT_ITEM_STATUS.to_string(),
        item_type: DEFAULT_ITEM_TYPE.to_string(),
        product_type: DEFAULT_PRODUCT_TYPE.to_string(),
        stock_on_hand: 0.0,
        reorder_level: None,
        last_synced_at: None,
    });

    ItemRecord {
        zoho_item_id: prefer(aggregate.item_id.as_deref(), base.zoho_item_id),
        sku: prefer(aggregate.sku.as_deref(), base.sku),
        name: prefer(aggregate.name.as_deref(), base.name)
            .or_else(|| prefer(aggregate.sku.as_deref(), None))
            .or_else(|| prefer(aggregate.item_id.as_deref(), None)),
        description: prefer(aggregate.description.as_deref(), base.description),
        rate: aggregate.rate.or(base.rate),
        reorder_level: Some(level),
        last_synced_at: Some(now),
        ..base
    }
}

fn group_key(line: &LineItem) -> Option<String> {
    non_blank(line.sku.as_deref())
        .map(|sku| format!("sku:{sku}"))
        .or_else(|| non_blank(line.item_id.as_deref()).map(|id| format!("id:{id}")))
}

fn fill(slot: &mut Option<String>, value: Option<&str>) {
    if slot.is_none() {
        *slot = non_blank(value).map(str::to_string);
    }
}

fn prefer(incoming: Option<&str>, current: Option<String>) -> Option<String> {
    non_blank(incoming).map(str::to_string).or(current)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
