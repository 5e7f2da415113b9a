//! Configuration structures
//!
//! Every section deserializes with defaults so a partial TOML or JSON file
//! (or none at all) still yields a usable configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACCOUNTS_URL, DEFAULT_AUTH_SCHEME, DEFAULT_DATABASE_PATH,
    DEFAULT_INVENTORY_TURNOVER_DAYS, DEFAULT_LOOK_BACK_DAYS, DEFAULT_POOL_SIZE,
    DEFAULT_REQUEST_TIMEOUT_SECS, ID_CHUNK_SIZE, MIN_REQUEST_INTERVAL_MS,
    OUTLIER_QUANTITY_THRESHOLD, REORDER_FLOOR_THRESHOLD,
};
use crate::errors::{Result, SuiteLinkError};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub vendor: VendorConfig,
    pub gateway: GatewayConfig,
    pub reorder: ReorderConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Check cross-field constraints that serde defaults cannot express.
    ///
    /// # Errors
    /// Returns `SuiteLinkError::Config` describing the first violated bound.
    pub fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            return Err(SuiteLinkError::Config("database.pool_size must be positive".into()));
        }
        if self.gateway.min_interval_ms == 0 {
            return Err(SuiteLinkError::Config("gateway.min_interval_ms must be positive".into()));
        }
        if self.gateway.request_timeout_secs == 0 {
            return Err(SuiteLinkError::Config(
                "gateway.request_timeout_secs must be positive".into(),
            ));
        }
        self.reorder.validate()
    }
}

/// SQLite store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DATABASE_PATH.to_string(), pool_size: DEFAULT_POOL_SIZE, busy_timeout_ms: 5000 }
    }
}

/// Vendor OAuth and API settings
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VendorConfig {
    /// Accounts server hosting the token and revoke endpoints.
    pub accounts_url: String,
    /// Base URL per sub-service, e.g. `inventory -> https://www.zohoapis.com/inventory/v1`.
    pub services: BTreeMap<String, String>,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
    pub organization_id: Option<String>,
    pub auth_scheme: String,
    /// Deployment-level token used when no stored token can be resolved.
    pub static_access_token: Option<String>,
}

impl Default for VendorConfig {
    fn default() -> Self {
        let services = [
            ("inventory", "https://www.zohoapis.com/inventory/v1"),
            ("books", "https://www.zohoapis.com/books/v3"),
            ("crm", "https://www.zohoapis.com/crm/v2"),
            ("desk", "https://desk.zoho.com/api/v1"),
        ]
        .into_iter()
        .map(|(name, url)| (name.to_string(), url.to_string()))
        .collect();

        Self {
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            services,
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: None,
            organization_id: None,
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            static_access_token: None,
        }
    }
}

impl VendorConfig {
    /// Base URL configured for `service`, if any.
    pub fn service_url(&self, service: &str) -> Option<&str> {
        self.services.get(service).map(String::as_str)
    }

    /// Check the client credentials an OAuth code exchange needs.
    ///
    /// # Errors
    /// Returns `SuiteLinkError::Config` naming the first empty credential.
    pub fn require_oauth_client(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(SuiteLinkError::Config("vendor.client_id is required for OAuth flows".into()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(SuiteLinkError::Config(
                "vendor.client_secret is required for OAuth flows".into(),
            ));
        }
        Ok(())
    }
}

// Secrets stay out of debug output.
impl std::fmt::Debug for VendorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorConfig")
            .field("accounts_url", &self.accounts_url)
            .field("services", &self.services)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("organization_id", &self.organization_id)
            .field("auth_scheme", &self.auth_scheme)
            .field("static_access_token", &self.static_access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Request gateway settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    pub min_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: MIN_REQUEST_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: format!("suitelink/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Reorder-level job parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReorderConfig {
    pub look_back_days: f64,
    pub inventory_turnover_days: f64,
    /// Line items with a quantity strictly above this are dropped.
    pub outlier_threshold: f64,
    /// Expected sales below this floor to a reorder level of 1.
    pub floor_threshold: f64,
    pub chunk_size: usize,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            look_back_days: DEFAULT_LOOK_BACK_DAYS,
            inventory_turnover_days: DEFAULT_INVENTORY_TURNOVER_DAYS,
            outlier_threshold: OUTLIER_QUANTITY_THRESHOLD,
            floor_threshold: REORDER_FLOOR_THRESHOLD,
            chunk_size: ID_CHUNK_SIZE,
        }
    }
}

impl ReorderConfig {
    /// # Errors
    /// Returns `SuiteLinkError::Config` for a zero chunk size or non-positive thresholds.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SuiteLinkError::Config("reorder.chunk_size must be positive".into()));
        }
        for (name, value) in [
            ("reorder.look_back_days", self.look_back_days),
            ("reorder.inventory_turnover_days", self.inventory_turnover_days),
            ("reorder.outlier_threshold", self.outlier_threshold),
            ("reorder.floor_threshold", self.floor_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SuiteLinkError::Config(format!("{name} must be a positive number")));
            }
        }
        Ok(())
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "info,suitelink=debug".to_string(), json: false }
    }
}
