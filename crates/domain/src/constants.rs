//! Integration constants
//!
//! Centralized location for all domain-level constants used throughout the
//! integration core.

// Vendor identity
pub const VENDOR: &str = "zoho";
pub const DEFAULT_AUTH_SCHEME: &str = "Zoho-oauthtoken";
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";

// Rate limiting
pub const MIN_REQUEST_INTERVAL_MS: u64 = 1000;

// Token lifecycle
pub const TOKEN_EXPIRY_SAFETY_MARGIN_SECS: i64 = 60;
pub const DEFAULT_TOKEN_EXPIRES_IN_SECS: i64 = 3600;

// Gateway
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Reorder job
pub const DEFAULT_LOOK_BACK_DAYS: f64 = 180.0;
pub const DEFAULT_INVENTORY_TURNOVER_DAYS: f64 = 90.0;
pub const OUTLIER_QUANTITY_THRESHOLD: f64 = 5.0;
pub const REORDER_FLOOR_THRESHOLD: f64 = 1.5;
pub const ID_CHUNK_SIZE: usize = 100;
pub const PARENT_TYPE_SALES_ORDER: &str = "salesorder";

// Defaults for item rows created by the reorder job
pub const DEFAULT_ITEM_STATUS: &str = "active";
pub const DEFAULT_ITEM_TYPE: &str = "inventory";
pub const DEFAULT_PRODUCT_TYPE: &str = "goods";

// Storage
pub const DEFAULT_DATABASE_PATH: &str = "suitelink.db";
pub const DEFAULT_POOL_SIZE: u32 = 4;
