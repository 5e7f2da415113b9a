//! Mock repository implementations for testing
//!
//! Provides in-memory mocks for the core repository ports, enabling
//! deterministic tests without database dependencies.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};
use suitelink_core::mapping::catalog::EntityKind;
use suitelink_core::{ItemRepository, MirrorStore, SalesHistoryRepository, TokenRepository, VendorApi};
use suitelink_domain::{
    AuthToken, ConflictKey, ItemRecord, LineItem, PersistenceFailure, Result as DomainResult,
    SalesOrderRef, SuiteLinkError, TokenType, TokenWrite,
};
use uuid::Uuid;

/// In-memory token store keeping every row, active or not.
#[derive(Default)]
pub struct MockTokenRepository {
    rows: Mutex<Vec<AuthToken>>,
    pub saves: AtomicUsize,
}

impl MockTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, including deactivated ones.
    pub fn all_rows(&self) -> Vec<AuthToken> {
        self.rows.lock().unwrap().clone()
    }

    pub fn active_count(&self, token_type: TokenType, owner_scope: Option<&str>) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| {
                row.is_active && row.token_type == token_type && row.owner_scope.as_deref() == owner_scope
            })
            .count()
    }
}

#[async_trait]
impl TokenRepository for MockTokenRepository {
    async fn find_active(
        &self,
        vendor: &str,
        token_type: TokenType,
        owner_scope: Option<&str>,
    ) -> DomainResult<Option<AuthToken>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| {
                row.is_active
                    && row.vendor == vendor
                    && row.token_type == token_type
                    && row.owner_scope.as_deref() == owner_scope
            })
            .cloned())
    }

    async fn save_token_row(&self, write: TokenWrite) -> DomainResult<AuthToken> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let same_tuple = |row: &AuthToken| {
            row.vendor == write.vendor
                && row.token_type == write.token_type
                && row.owner_scope == write.owner_scope
        };

        let existing = rows.iter().position(|row| row.is_active && same_tuple(row));
        for row in rows.iter_mut().filter(|row| same_tuple(row)) {
            row.is_active = false;
        }

        let now = Utc::now();
        let saved = match existing {
            Some(index) => {
                let row = &mut rows[index];
                row.token = write.token;
                row.expires_at = write.expires_at;
                row.metadata = write.metadata;
                row.description = write.description;
                row.is_active = true;
                row.updated_at = now;
                row.clone()
            }
            None => {
                let row = AuthToken {
                    id: Uuid::new_v4().to_string(),
                    vendor: write.vendor,
                    token_type: write.token_type,
                    token: write.token,
                    expires_at: write.expires_at,
                    owner_scope: write.owner_scope,
                    metadata: write.metadata,
                    is_active: true,
                    description: write.description,
                    created_at: now,
                    updated_at: now,
                };
                rows.push(row.clone());
                row
            }
        };
        Ok(saved)
    }

    async fn deactivate_scope(&self, vendor: &str, owner_scope: Option<&str>) -> DomainResult<usize> {
        let mut rows = self.rows.lock().unwrap();
        let mut count = 0;
        for row in rows.iter_mut() {
            if row.is_active && row.vendor == vendor && row.owner_scope.as_deref() == owner_scope {
                row.is_active = false;
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Sales history seeded with orders and their line items.
#[derive(Default)]
pub struct MockSalesHistory {
    orders: Mutex<Vec<SalesOrderRef>>,
    lines: Mutex<Vec<LineItem>>,
    fail_orders: Mutex<Option<SuiteLinkError>>,
    /// Chunk calls (0-based) that fail
    failing_chunks: Mutex<Vec<usize>>,
    pub chunk_calls: AtomicUsize,
    pub chunk_sizes: Mutex<Vec<usize>>,
}

impl MockSalesHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an order dated `date` with one line per `(sku, quantity)`.
    pub fn with_order(self, date: NaiveDate, lines: &[(&str, f64)]) -> Self {
        let id = Uuid::new_v4().to_string();
        self.add_order(&id, date);
        for (sku, quantity) in lines {
            self.add_line(&id, Some(sku), None, *quantity);
        }
        self
    }

    pub fn add_order(&self, id: &str, date: NaiveDate) {
        self.orders.lock().unwrap().push(SalesOrderRef { id: id.to_string(), date });
    }

    pub fn add_line(&self, parent_id: &str, sku: Option<&str>, item_id: Option<&str>, quantity: f64) {
        self.lines.lock().unwrap().push(LineItem {
            id: Uuid::new_v4().to_string(),
            parent_id: parent_id.to_string(),
            parent_type: "salesorder".into(),
            item_id: item_id.map(str::to_string),
            sku: sku.map(str::to_string),
            name: sku.map(|s| format!("Product {s}")),
            description: None,
            rate: Some(10.0),
            quantity,
            item_total: Some(10.0 * quantity),
        });
    }

    pub fn fail_order_query(&self, error: SuiteLinkError) {
        *self.fail_orders.lock().unwrap() = Some(error);
    }

    pub fn fail_chunk(&self, index: usize) {
        self.failing_chunks.lock().unwrap().push(index);
    }
}

#[async_trait]
impl SalesHistoryRepository for MockSalesHistory {
    async fn find_sales_orders_since(&self, cutoff: NaiveDate) -> DomainResult<Vec<SalesOrderRef>> {
        if let Some(err) = self.fail_orders.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.orders.lock().unwrap().iter().filter(|o| o.date >= cutoff).cloned().collect())
    }

    async fn find_line_items(
        &self,
        parent_ids: &[String],
        parent_type: &str,
    ) -> DomainResult<Vec<LineItem>> {
        let call = self.chunk_calls.fetch_add(1, Ordering::SeqCst);
        self.chunk_sizes.lock().unwrap().push(parent_ids.len());
        if self.failing_chunks.lock().unwrap().contains(&call) {
            return Err(SuiteLinkError::Persistence(
                PersistenceFailure::new("statement timeout").with_code("57014"),
            ));
        }
        Ok(self
            .lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.parent_type == parent_type && parent_ids.contains(&l.parent_id))
            .cloned()
            .collect())
    }
}

/// Item table keyed by row id.
#[derive(Default)]
pub struct MockItemRepository {
    items: Mutex<Vec<ItemRecord>>,
    failing_skus: Mutex<Vec<String>>,
    pub upserts: Mutex<Vec<(ItemRecord, ConflictKey)>>,
}

impl MockItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, item: ItemRecord) -> Self {
        self.items.lock().unwrap().push(item);
        self
    }

    pub fn fail_upsert_for(&self, sku: &str) {
        self.failing_skus.lock().unwrap().push(sku.to_string());
    }

    pub fn items(&self) -> Vec<ItemRecord> {
        self.items.lock().unwrap().clone()
    }

    pub fn by_sku(&self, sku: &str) -> Option<ItemRecord> {
        self.items().into_iter().find(|item| item.sku.as_deref() == Some(sku))
    }
}

#[async_trait]
impl ItemRepository for MockItemRepository {
    async fn find_by_sku(&self, sku: &str) -> DomainResult<Option<ItemRecord>> {
        Ok(self.by_sku(sku))
    }

    async fn find_by_item_id(&self, item_id: &str) -> DomainResult<Option<ItemRecord>> {
        Ok(self.items().into_iter().find(|item| item.zoho_item_id.as_deref() == Some(item_id)))
    }

    async fn upsert_item(&self, record: &ItemRecord, key: ConflictKey) -> DomainResult<ItemRecord> {
        if let Some(sku) = &record.sku {
            if self.failing_skus.lock().unwrap().contains(sku) {
                return Err(SuiteLinkError::Database(format!("constraint violation for {sku}")));
            }
        }
        self.upserts.lock().unwrap().push((record.clone(), key));

        let mut items = self.items.lock().unwrap();
        let matches = |item: &ItemRecord| match key {
            ConflictKey::Sku => item.sku.is_some() && item.sku == record.sku,
            ConflictKey::ItemId => item.zoho_item_id.is_some() && item.zoho_item_id == record.zoho_item_id,
        };
        match items.iter_mut().find(|item| matches(item)) {
            Some(existing) => {
                let id = existing.id.clone();
                *existing = ItemRecord { id, ..record.clone() };
                Ok(existing.clone())
            }
            None => {
                items.push(record.clone());
                Ok(record.clone())
            }
        }
    }
}

/// Mirror store remembering every upsert call.
#[derive(Default)]
pub struct MockMirrorStore {
    pub calls: Mutex<Vec<(EntityKind, String, Vec<Map<String, Value>>)>>,
}

impl MockMirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored_rows(&self) -> Vec<Map<String, Value>> {
        self.calls.lock().unwrap().iter().flat_map(|(_, _, rows)| rows.clone()).collect()
    }
}

#[async_trait]
impl MirrorStore for MockMirrorStore {
    async fn upsert_records(
        &self,
        kind: EntityKind,
        key_column: &str,
        rows: &[Map<String, Value>],
    ) -> DomainResult<usize> {
        self.calls.lock().unwrap().push((kind, key_column.to_string(), rows.to_vec()));
        Ok(rows.len())
    }
}

/// Vendor API replaying canned pages in order.
#[derive(Default)]
pub struct ScriptedVendorApi {
    pages: Mutex<Vec<Value>>,
    pub requests: Mutex<Vec<(String, String, Vec<(String, String)>, Option<String>)>>,
}

impl ScriptedVendorApi {
    pub fn new(pages: Vec<Value>) -> Arc<Self> {
        Arc::new(Self { pages: Mutex::new(pages), requests: Mutex::default() })
    }
}

#[async_trait]
impl VendorApi for ScriptedVendorApi {
    async fn get_json(
        &self,
        service: &str,
        endpoint: &str,
        query: &[(String, String)],
        owner_scope: Option<&str>,
    ) -> DomainResult<Value> {
        self.requests.lock().unwrap().push((
            service.to_string(),
            endpoint.to_string(),
            query.to_vec(),
            owner_scope.map(str::to_string),
        ));
        let mut pages = self.pages.lock().unwrap();
        if pages.is_empty() {
            return Err(SuiteLinkError::Vendor { status: 500, body: "no more scripted pages".into() });
        }
        Ok(pages.remove(0))
    }
}
