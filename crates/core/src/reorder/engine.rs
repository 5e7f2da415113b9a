//! Reorder-level batch job
//!
//! Reads the mirrored sales history for a look-back window, drops outlier
//! lines, aggregates per item and writes a fresh reorder level to every item
//! row. Row-level problems are collected into the result; only a failure of
//! the primary sales-order query aborts the job.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use suitelink_common::time::{Clock, SystemClock};
use suitelink_domain::constants::PARENT_TYPE_SALES_ORDER;
use suitelink_domain::{
    ConflictKey, ItemAction, ItemDetail, ItemRecord, LineItem, LineItemAggregate, ReorderConfig,
    ReorderJobRequest, ReorderJobResult, ReorderParams, Result, RowError, SalesOrderRef,
    SuiteLinkError,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::calculator::{aggregate, filter_outliers, merge_item, reorder_level};
use super::ports::{ItemRepository, SalesHistoryRepository};
use crate::mapping::catalog::EntityKind;
use crate::mapping::EntityMapper;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Batch job computing item reorder levels from recent sales
pub struct ReorderLevelEngine {
    history: Arc<dyn SalesHistoryRepository>,
    items: Arc<dyn ItemRepository>,
    clock: Arc<dyn Clock>,
    config: ReorderConfig,
    item_mapper: EntityMapper,
}

/// Line items gathered across all id chunks
struct FetchedLines {
    lines: Vec<LineItem>,
    skipped_chunks: usize,
}

impl ReorderLevelEngine {
    /// # Errors
    /// Returns `SuiteLinkError::Config` for an invalid configuration.
    pub fn new(
        history: Arc<dyn SalesHistoryRepository>,
        items: Arc<dyn ItemRepository>,
        config: ReorderConfig,
    ) -> Result<Self> {
        Self::with_clock(history, items, config, Arc::new(SystemClock))
    }

    /// # Errors
    /// Returns `SuiteLinkError::Config` for an invalid configuration.
    pub fn with_clock(
        history: Arc<dyn SalesHistoryRepository>,
        items: Arc<dyn ItemRepository>,
        config: ReorderConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let item_mapper = EntityMapper::for_kind(EntityKind::Item)?;
        Ok(Self { history, items, clock, config, item_mapper })
    }

    pub const fn config(&self) -> &ReorderConfig {
        &self.config
    }

    /// Validate a raw request against the configured defaults and run.
    ///
    /// # Errors
    /// `InvalidInput` for non-positive parameters, otherwise as [`run`](Self::run).
    pub async fn run_request(&self, request: ReorderJobRequest) -> Result<ReorderJobResult> {
        let params = request.validate_with(ReorderParams {
            look_back_days: self.config.look_back_days,
            inventory_turnover_days: self.config.inventory_turnover_days,
        })?;
        self.run(params).await
    }

    /// Run the job once.
    ///
    /// # Errors
    /// Fails only when the sales-order window query itself fails; the error
    /// carries the store's diagnostics. Every other problem is reported in
    /// [`ReorderJobResult::errors`].
    #[instrument(
        skip(self),
        fields(look_back_days = params.look_back_days, turnover_days = params.inventory_turnover_days)
    )]
    pub async fn run(&self, params: ReorderParams) -> Result<ReorderJobResult> {
        let now = self.clock.now();
        let cutoff = cutoff_date(now, params.look_back_days)?;

        let orders = self
            .history
            .find_sales_orders_since(cutoff)
            .await
            .map_err(|err| SuiteLinkError::fatal("failed to load sales orders", err))?;

        if orders.is_empty() {
            info!(%cutoff, "No sales orders in window");
            return Ok(ReorderJobResult::empty(
                format!("No sales orders found since {cutoff}; nothing to update"),
                Vec::new(),
            ));
        }

        let order_count = orders.len();
        let (order_ids, mut errors) = well_formed_ids(orders);
        if order_ids.is_empty() {
            return Ok(ReorderJobResult::empty(
                format!("None of the {order_count} sales orders since {cutoff} has a valid identifier"),
                errors,
            ));
        }

        let FetchedLines { lines, skipped_chunks } = self.fetch_line_items(&order_ids).await;
        let fetched = lines.len();
        let lines = filter_outliers(lines, self.config.outlier_threshold);
        let outliers = fetched - lines.len();
        debug!(fetched, outliers, skipped_chunks, "Line items loaded");

        if lines.is_empty() {
            return Ok(ReorderJobResult::empty(
                format!(
                    "No usable line items across {} sales orders since {cutoff} \
                     ({fetched} fetched, {outliers} outliers excluded, {skipped_chunks} chunks skipped)",
                    order_ids.len()
                ),
                errors,
            ));
        }

        let aggregates = aggregate(&lines);
        let mut details = Vec::with_capacity(aggregates.len());
        for item in &aggregates {
            let level = reorder_level(item.total_quantity, &params, self.config.floor_threshold);
            match self.upsert_aggregate(item, level.level, now).await {
                Ok((record, action)) => details.push(ItemDetail {
                    sku: record.sku,
                    item_id: record.zoho_item_id,
                    name: record.name,
                    total_quantity: item.total_quantity,
                    line_count: item.line_count,
                    daily_average: level.daily_average,
                    expected_sales: level.expected_sales,
                    reorder_level: level.level,
                    action,
                }),
                Err(row_error) => {
                    warn!(sku = ?row_error.sku, item_id = ?row_error.item_id, error = %row_error.error, "Item not updated");
                    errors.push(row_error);
                }
            }
        }

        let updated = details.len();
        let mut summary = format!(
            "Updated reorder levels for {updated} of {} items from {} line items across {} sales orders",
            aggregates.len(),
            lines.len(),
            order_ids.len()
        );
        if outliers > 0 {
            summary.push_str(&format!("; {outliers} outlier line items excluded"));
        }
        if skipped_chunks > 0 {
            summary.push_str(&format!("; {skipped_chunks} line item chunks skipped after errors"));
        }
        if !errors.is_empty() {
            summary.push_str(&format!("; {} errors", errors.len()));
        }
        info!(updated, errors = errors.len(), "Reorder job finished");

        Ok(ReorderJobResult { updated, errors, summary, item_details: Some(details) })
    }

    async fn fetch_line_items(&self, order_ids: &[String]) -> FetchedLines {
        let mut lines = Vec::new();
        let mut skipped_chunks = 0;
        for (index, chunk) in order_ids.chunks(self.config.chunk_size).enumerate() {
            match self.history.find_line_items(chunk, PARENT_TYPE_SALES_ORDER).await {
                Ok(mut batch) => lines.append(&mut batch),
                Err(err) => {
                    warn!(chunk = index, size = chunk.len(), error = %err, "Skipping line item chunk");
                    skipped_chunks += 1;
                }
            }
        }
        FetchedLines { lines, skipped_chunks }
    }

    async fn upsert_aggregate(
        &self,
        item: &LineItemAggregate,
        level: i64,
        now: DateTime<Utc>,
    ) -> std::result::Result<(ItemRecord, ItemAction), RowError> {
        let row_error = |error: String| RowError {
            sku: item.sku.clone(),
            item_id: item.item_id.clone(),
            name: item.name.clone(),
            error,
        };

        let (existing, matched) = self.find_existing(item).await.map_err(|e| row_error(e.to_string()))?;
        let record = merge_item(existing.as_ref(), item, level, now);

        let key = matched
            .or_else(|| record.conflict_key())
            .ok_or_else(|| row_error("line items carry neither a SKU nor an item id".into()))?;

        let validation = self.validate_row(&record);
        if !validation.is_empty() {
            return Err(row_error(format!("missing required fields: {}", validation.join(", "))));
        }

        let stored = self
            .items
            .upsert_item(&record, key)
            .await
            .map_err(|e| row_error(format!("failed to upsert item: {e}")))?;

        let action = if existing.is_some() { ItemAction::Updated } else { ItemAction::Created };
        Ok((stored, action))
    }

    async fn find_existing(
        &self,
        item: &LineItemAggregate,
    ) -> Result<(Option<ItemRecord>, Option<ConflictKey>)> {
        if let Some(sku) = item.sku.as_deref() {
            if let Some(found) = self.items.find_by_sku(sku).await? {
                return Ok((Some(found), Some(ConflictKey::Sku)));
            }
        }
        if let Some(item_id) = item.item_id.as_deref() {
            if let Some(found) = self.items.find_by_item_id(item_id).await? {
                return Ok((Some(found), Some(ConflictKey::ItemId)));
            }
        }
        Ok((None, None))
    }

    /// Required item columns that are empty, other than the vendor id,
    /// which rows created from sales history may not know yet.
    fn validate_row(&self, record: &ItemRecord) -> Vec<String> {
        let row = match serde_json::to_value(record) {
            Ok(serde_json::Value::Object(row)) => row,
            _ => return vec!["record".to_string()],
        };
        let (_, primary) = self.item_mapper.schema().primary_field();
        self.item_mapper
            .validate_record(&row)
            .missing
            .into_iter()
            .filter(|column| column != primary.target)
            .collect()
    }
}

fn cutoff_date(now: DateTime<Utc>, look_back_days: f64) -> Result<NaiveDate> {
    #[allow(clippy::cast_possible_truncation)]
    let millis = (look_back_days * MILLIS_PER_DAY) as i64;
    TimeDelta::try_milliseconds(millis)
        .and_then(|window| now.checked_sub_signed(window))
        .map(|cutoff| cutoff.date_naive())
        .ok_or_else(|| {
            SuiteLinkError::InvalidInput(format!("lookBackDays {look_back_days} is out of range"))
        })
}

/// Keep identifiers that parse as UUIDs; report the rest.
fn well_formed_ids(orders: Vec<SalesOrderRef>) -> (Vec<String>, Vec<RowError>) {
    let mut ids = Vec::with_capacity(orders.len());
    let mut errors = Vec::new();
    for order in orders {
        if Uuid::parse_str(&order.id).is_ok() {
            ids.push(order.id);
        } else {
            errors.push(RowError::new(format!(
                "sales order dated {} has malformed identifier '{}'",
                order.date, order.id
            )));
        }
    }
    (ids, errors)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn cutoff_subtracts_whole_and_fractional_days() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        assert_eq!(cutoff_date(now, 180.0).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(cutoff_date(now, 0.25).unwrap(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(cutoff_date(now, 0.75).unwrap(), NaiveDate::from_ymd_opt(2024, 6, 29).unwrap());
    }

    #[test]
    fn cutoff_rejects_absurd_windows() {
        let now = Utc::now();
        assert!(matches!(cutoff_date(now, 1e300), Err(SuiteLinkError::InvalidInput(_))));
    }

    #[test]
    fn malformed_ids_become_row_errors() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let good = Uuid::new_v4().to_string();
        let (ids, errors) = well_formed_ids(vec![
            SalesOrderRef { id: good.clone(), date },
            SalesOrderRef { id: "SO-17".into(), date },
        ]);
        assert_eq!(ids, vec![good]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].error.contains("SO-17"));
    }
}
