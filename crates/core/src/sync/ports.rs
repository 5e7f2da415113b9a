//! Port interfaces for entity mirroring

use async_trait::async_trait;
use serde_json::{Map, Value};
use suitelink_domain::Result;

use crate::mapping::catalog::EntityKind;

/// Destination of mapped vendor records
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Insert or update `rows` of `kind`, matching existing rows on
    /// `key_column`. Returns the number of rows written.
    async fn upsert_records(
        &self,
        kind: EntityKind,
        key_column: &str,
        rows: &[Map<String, Value>],
    ) -> Result<usize>;
}
