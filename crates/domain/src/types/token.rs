//! OAuth token rows and lifecycle views

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::impl_text_enum_conversions;

/// Kind of credential held by a token row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl_text_enum_conversions!(TokenType {
    Access => "access",
    Refresh => "refresh",
});

/// Persisted credential row.
///
/// At most one row per `(vendor, token_type, owner_scope)` is active at any
/// time; the store enforces this with a partial unique index.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthToken {
    pub id: String,
    pub vendor: String,
    pub token_type: TokenType,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_scope: Option<String>,
    pub metadata: Map<String, Value>,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthToken {
    /// Whether the row carries an expiry that lies at or before `now`.
    ///
    /// Rows without an expiry (refresh tokens) never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Whether the row expires within `margin` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at - margin <= now)
    }

    /// Sub-service that produced the row, read from its metadata.
    pub fn service(&self) -> Option<&str> {
        self.metadata.get("service").and_then(Value::as_str)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("id", &self.id)
            .field("vendor", &self.vendor)
            .field("token_type", &self.token_type)
            .field("token", &format_args!("[{} chars]", self.token.len()))
            .field("expires_at", &self.expires_at)
            .field("owner_scope", &self.owner_scope)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

/// Values written by a single token save; the store decides whether they
/// update an existing row or create a new one.
#[derive(Clone, PartialEq)]
pub struct TokenWrite {
    pub vendor: String,
    pub token_type: TokenType,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_scope: Option<String>,
    pub metadata: Map<String, Value>,
    pub description: Option<String>,
}

impl std::fmt::Debug for TokenWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenWrite")
            .field("vendor", &self.vendor)
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("owner_scope", &self.owner_scope)
            .finish_non_exhaustive()
    }
}

/// Active rows for one owner scope, read without side effects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenRows {
    pub access: Option<AuthToken>,
    pub refresh: Option<AuthToken>,
}

/// Input to `save_token`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveTokenRequest {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: Option<Map<String, Value>>,
}

impl std::fmt::Debug for SaveTokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveTokenRequest")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Usable credentials handed to callers of `get_token`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_scope: Option<String>,
}

impl std::fmt::Debug for TokenBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBundle")
            .field("access_token", &format_args!("[{} chars]", self.access_token.len()))
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .field("owner_scope", &self.owner_scope)
            .finish()
    }
}

/// Read-only view used by status and health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatus {
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub access_expires_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
    pub service: Option<String>,
    pub owner_scope: Option<String>,
}

/// Result of revoking the credentials of one owner scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeOutcome {
    /// Whether the vendor acknowledged the remote revocation.
    pub remote_revoked: bool,
    /// Number of rows switched to inactive locally.
    pub deactivated: usize,
}
