//! Paged mirroring of one entity kind

use std::sync::Arc;

use serde_json::{Map, Value};
use suitelink_domain::{Result, RowError, SuiteLinkError, SyncReport};
use tracing::{debug, info, instrument, warn};

use super::ports::MirrorStore;
use crate::gateway::ports::VendorApi;
use crate::mapping::catalog::{EntityKind, SERVICE_CRM, SERVICE_DESK};
use crate::mapping::EntityMapper;

const DEFAULT_PAGE_SIZE: usize = 200;
const DEFAULT_MAX_PAGES: usize = 500;

/// Key under which a mapped sales order carries its mapped line items
pub const NESTED_LINE_ITEMS: &str = "line_items";

/// Pulls entity pages through the gateway and upserts them into the mirror
pub struct EntitySyncService {
    api: Arc<dyn VendorApi>,
    store: Arc<dyn MirrorStore>,
    page_size: usize,
    max_pages: usize,
}

impl EntitySyncService {
    pub fn new(api: Arc<dyn VendorApi>, store: Arc<dyn MirrorStore>) -> Self {
        Self { api, store, page_size: DEFAULT_PAGE_SIZE, max_pages: DEFAULT_MAX_PAGES }
    }

    /// Records requested per page
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Upper bound on pages fetched in one run
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Mirror every page of `kind` visible to `owner_scope`.
    ///
    /// Records failing validation are reported in [`SyncReport::rejected`]
    /// and skipped; transport and store failures abort the run.
    ///
    /// # Errors
    /// `InvalidInput` for kinds that only exist nested in a parent document,
    /// otherwise any gateway or store error.
    #[instrument(skip(self), fields(entity = %kind))]
    pub async fn sync_entity(&self, kind: EntityKind, owner_scope: Option<&str>) -> Result<SyncReport> {
        if kind == EntityKind::SalesOrderLineItem {
            return Err(SuiteLinkError::InvalidInput(format!(
                "{kind} records are only delivered inside their sales order"
            )));
        }

        let mapper = EntityMapper::for_kind(kind)?;
        let (_, primary) = mapper.schema().primary_field();
        let primary = *primary;
        let line_mapper = match kind {
            EntityKind::SalesOrder => Some(EntityMapper::for_kind(EntityKind::SalesOrderLineItem)?),
            _ => None,
        };
        let mut report = SyncReport { entity: kind.to_string(), ..SyncReport::default() };

        for page in 1..=self.max_pages {
            let query = self.page_query(kind, page);
            let response =
                self.api.get_json(kind.service(), mapper.schema().endpoint(), &query, owner_scope).await?;
            let records = mapper.extract_from_response(&response);
            report.pages += 1;
            report.fetched += records.len();

            let mut rows = Vec::with_capacity(records.len());
            for record in &records {
                let mut row = mapper.transform_to_db_record(record);
                let validation = mapper.validate_record(&row);
                if validation.is_valid() {
                    if let Some(lines) = &line_mapper {
                        if let Some(nested) = nested_line_items(lines, record) {
                            row.insert(NESTED_LINE_ITEMS.to_string(), Value::Array(nested));
                        }
                    }
                    rows.push(row);
                } else {
                    let id = row.get(primary.target).and_then(Value::as_str).map(str::to_string);
                    report.rejected.push(RowError {
                        sku: row.get("sku").and_then(Value::as_str).map(str::to_string),
                        item_id: id,
                        name: row.get("name").and_then(Value::as_str).map(str::to_string),
                        error: format!("missing required fields: {}", validation.missing.join(", ")),
                    });
                }
            }

            if !rows.is_empty() {
                report.stored += self.store.upsert_records(kind, primary.target, &rows).await?;
            }
            debug!(page, fetched = records.len(), stored = rows.len(), "Page mirrored");

            if !self.has_more(kind, &response, records.len()) {
                break;
            }
            if page == self.max_pages {
                warn!(max_pages = self.max_pages, "Stopped paging at the page limit");
            }
        }

        info!(
            pages = report.pages,
            fetched = report.fetched,
            stored = report.stored,
            rejected = report.rejected.len(),
            "Entity sync finished"
        );
        Ok(report)
    }

    fn page_query(&self, kind: EntityKind, page: usize) -> Vec<(String, String)> {
        if kind.service() == SERVICE_DESK {
            let from = (page - 1) * self.page_size + 1;
            vec![("from".into(), from.to_string()), ("limit".into(), self.page_size.to_string())]
        } else {
            vec![("page".into(), page.to_string()), ("per_page".into(), self.page_size.to_string())]
        }
    }

    fn has_more(&self, kind: EntityKind, response: &Value, received: usize) -> bool {
        match kind.service() {
            SERVICE_CRM => response
                .pointer("/info/more_records")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            SERVICE_DESK => received == self.page_size,
            _ => response
                .pointer("/page_context/has_more_page")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Map the line items listed inside a sales order.
///
/// Returns `None` when the payload carries no `line_items` array, so the
/// store keeps whatever lines it already has for that order. Lines missing
/// their id or quantity are dropped.
fn nested_line_items(mapper: &EntityMapper, record: &Map<String, Value>) -> Option<Vec<Value>> {
    let lines = record.get(NESTED_LINE_ITEMS)?.as_array()?;
    let mut mapped = Vec::with_capacity(lines.len());
    for line in lines.iter().filter_map(Value::as_object) {
        let row = mapper.transform_to_db_record(line);
        if mapper.validate_record(&row).is_valid() {
            mapped.push(Value::Object(row));
        } else {
            warn!(line = ?line.get("line_item_id"), "Dropping incomplete sales order line");
        }
    }
    Some(mapped)
}
