//! Entity sync reporting

use serde::{Deserialize, Serialize};

use super::reorder::RowError;

/// Outcome of mirroring one entity kind from the vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub entity: String,
    pub pages: usize,
    pub fetched: usize,
    pub stored: usize,
    pub rejected: Vec<RowError>,
}
