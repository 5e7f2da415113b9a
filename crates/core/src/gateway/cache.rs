//! Process-memory access token cache
//!
//! Entries are keyed by owner scope and considered stale once the current
//! time reaches the token expiry minus a safety margin. Stale entries are
//! dropped on read. Nothing here is persisted.

use std::sync::Arc;

use chrono::TimeDelta;
use dashmap::DashMap;
use suitelink_common::time::{Clock, SystemClock};
use suitelink_domain::constants::TOKEN_EXPIRY_SAFETY_MARGIN_SECS;
use tracing::debug;

/// Cached access token for one owner scope
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    /// Expiry in milliseconds since the epoch; `None` never expires
    pub expires_at_millis: Option<i64>,
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at_millis", &self.expires_at_millis)
            .finish()
    }
}

/// Injectable token cache owned by a gateway instance
pub trait TokenCache: Send + Sync {
    /// Return the entry for `owner_scope` if it is still usable
    fn get(&self, owner_scope: Option<&str>) -> Option<CachedToken>;

    /// Store or replace the entry for `owner_scope`
    fn set(&self, owner_scope: Option<&str>, token: CachedToken);

    /// Drop the entry for `owner_scope`
    fn invalidate(&self, owner_scope: Option<&str>);
}

/// [`TokenCache`] backed by a concurrent map and an injectable clock
pub struct InMemoryTokenCache {
    entries: DashMap<Option<String>, CachedToken>,
    clock: Arc<dyn Clock>,
    safety_margin: TimeDelta,
}

impl InMemoryTokenCache {
    /// Cache with the system clock and the default 60 second margin
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            safety_margin: TimeDelta::seconds(TOKEN_EXPIRY_SAFETY_MARGIN_SECS),
        }
    }

    #[must_use]
    pub fn with_safety_margin(mut self, margin: TimeDelta) -> Self {
        self.safety_margin = margin;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, token: &CachedToken) -> bool {
        token.expires_at_millis.map_or(true, |expires_at| {
            self.clock.millis_since_epoch() < expires_at - self.safety_margin.num_milliseconds()
        })
    }
}

impl Default for InMemoryTokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCache for InMemoryTokenCache {
    fn get(&self, owner_scope: Option<&str>) -> Option<CachedToken> {
        let key = owner_scope.map(str::to_string);
        let token = self.entries.get(&key).map(|entry| entry.value().clone())?;
        if self.is_fresh(&token) {
            return Some(token);
        }
        debug!(owner_scope = ?owner_scope, "cached token past safety margin, evicting");
        self.entries.remove(&key);
        None
    }

    fn set(&self, owner_scope: Option<&str>, token: CachedToken) {
        self.entries.insert(owner_scope.map(str::to_string), token);
    }

    fn invalidate(&self, owner_scope: Option<&str>) {
        self.entries.remove(&owner_scope.map(str::to_string));
    }
}
