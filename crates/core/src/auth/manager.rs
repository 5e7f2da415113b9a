//! Token manager with transparent refresh
//!
//! Manages the OAuth token lifecycle per `(vendor, owner_scope)`:
//! - Side-effect free reads of the stored rows
//! - Retrieval that refreshes an expired access token exactly once
//! - Authorization code exchange and persistence of the first pair
//! - Two-phase revocation (remote best effort, then local deactivation)
//!
//! Refreshes for the same owner scope are serialized. A caller that waited
//! for another caller's refresh reuses the rotated token instead of hitting
//! the token endpoint a second time.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde_json::{Map, Value};
use suitelink_common::auth::{OAuthClientError, OAuthClientTrait, TokenSet};
use suitelink_common::time::{Clock, SystemClock};
use suitelink_domain::constants::{
    DEFAULT_TOKEN_EXPIRES_IN_SECS, TOKEN_EXPIRY_SAFETY_MARGIN_SECS, VENDOR,
};
use suitelink_domain::{
    AuthToken, Result, RevokeOutcome, SaveTokenRequest, SuiteLinkError, TokenBundle, TokenRows,
    TokenStatus, TokenType, TokenWrite,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::ports::TokenRepository;

/// Token lifecycle service shared by every vendor sub-service
pub struct AuthManager {
    repository: Arc<dyn TokenRepository>,
    oauth: Arc<dyn OAuthClientTrait>,
    clock: Arc<dyn Clock>,
    vendor: String,
    refresh_locks: DashMap<Option<String>, Arc<Mutex<()>>>,
}

impl AuthManager {
    /// Create a manager using the system clock
    pub fn new(repository: Arc<dyn TokenRepository>, oauth: Arc<dyn OAuthClientTrait>) -> Self {
        Self::with_clock(repository, oauth, Arc::new(SystemClock))
    }

    /// Create a manager with an injected clock
    pub fn with_clock(
        repository: Arc<dyn TokenRepository>,
        oauth: Arc<dyn OAuthClientTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            oauth,
            clock,
            vendor: VENDOR.to_string(),
            refresh_locks: DashMap::new(),
        }
    }

    /// Vendor identifier written to every row
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Read the active access and refresh rows without side effects.
    ///
    /// # Errors
    /// Propagates repository failures.
    pub async fn read_raw_token_rows(&self, owner_scope: Option<&str>) -> Result<TokenRows> {
        let access = self.repository.find_active(&self.vendor, TokenType::Access, owner_scope).await?;
        let refresh =
            self.repository.find_active(&self.vendor, TokenType::Refresh, owner_scope).await?;
        Ok(TokenRows { access, refresh })
    }

    /// Get usable credentials, refreshing an expired access token once.
    ///
    /// A token inside the 60 second safety margin counts as expired when a
    /// refresh token is available; without one it is used until it actually
    /// expires. Returns `Ok(None)` when no access token is stored, or when it
    /// has expired and there is no refresh token to recover with.
    ///
    /// # Errors
    /// Propagates repository failures and token endpoint failures raised by
    /// the refresh.
    pub async fn get_token(
        &self,
        service: &str,
        owner_scope: Option<&str>,
    ) -> Result<Option<TokenBundle>> {
        self.get_valid_access_token(service, owner_scope).await
    }

    /// See [`AuthManager::get_token`].
    ///
    /// # Errors
    /// Propagates repository and token endpoint failures.
    #[instrument(skip(self), fields(vendor = %self.vendor))]
    pub async fn get_valid_access_token(
        &self,
        service: &str,
        owner_scope: Option<&str>,
    ) -> Result<Option<TokenBundle>> {
        let rows = self.read_raw_token_rows(owner_scope).await?;

        let Some(access) = rows.access else {
            debug!("no active access token");
            return Ok(None);
        };

        let now = self.clock.now();
        if !access.expires_within(now, safety_margin()) {
            return Ok(Some(bundle(&access, rows.refresh.as_ref())));
        }

        if rows.refresh.is_none() {
            if !access.is_expired_at(now) {
                return Ok(Some(bundle(&access, None)));
            }
            debug!(expires_at = ?access.expires_at, "access token expired and no refresh token stored");
            return Ok(None);
        }

        info!(expires_at = ?access.expires_at, "access token expiring, refreshing");
        self.refresh_unless_rotated(service, owner_scope, Some(&access.token)).await.map(Some)
    }

    /// Persist a token pair for `owner_scope`.
    ///
    /// The access row is always written; the refresh row only when the
    /// request carries one. Returns the rows as stored.
    ///
    /// # Errors
    /// Returns `InvalidInput` for an empty access token or a blank owner
    /// scope, and propagates repository failures.
    #[instrument(skip(self, request), fields(vendor = %self.vendor))]
    pub async fn save_token(
        &self,
        service: &str,
        owner_scope: Option<&str>,
        request: SaveTokenRequest,
    ) -> Result<TokenRows> {
        if request.access_token.trim().is_empty() {
            return Err(SuiteLinkError::InvalidInput("access token must not be empty".into()));
        }
        // A blank scope would share the unique-index bucket of the system-wide scope.
        if owner_scope.is_some_and(|scope| scope.trim().is_empty()) {
            return Err(SuiteLinkError::InvalidInput(
                "owner scope must be omitted or non-empty".into(),
            ));
        }

        let metadata = self.audit_metadata(service, request.metadata.unwrap_or_default(), "save");

        let access = self
            .repository
            .save_token_row(TokenWrite {
                vendor: self.vendor.clone(),
                token_type: TokenType::Access,
                token: request.access_token,
                expires_at: request.expires_at,
                owner_scope: owner_scope.map(str::to_string),
                metadata: metadata.clone(),
                description: Some(format!("{service} access token")),
            })
            .await?;

        let refresh = match request.refresh_token.filter(|token| !token.is_empty()) {
            Some(token) => Some(
                self.repository
                    .save_token_row(TokenWrite {
                        vendor: self.vendor.clone(),
                        token_type: TokenType::Refresh,
                        token,
                        expires_at: None,
                        owner_scope: owner_scope.map(str::to_string),
                        metadata,
                        description: Some(format!("{service} refresh token")),
                    })
                    .await?,
            ),
            None => None,
        };

        info!(has_refresh = refresh.is_some(), expires_at = ?access.expires_at, "tokens saved");
        Ok(TokenRows { access: Some(access), refresh })
    }

    /// Mint a new access token from the stored refresh token.
    ///
    /// Reads the rows directly, never through [`AuthManager::get_token`].
    ///
    /// # Errors
    /// Returns `MissingRefreshToken` when no refresh row is active, and
    /// propagates token endpoint and repository failures.
    #[instrument(skip(self), fields(vendor = %self.vendor))]
    pub async fn refresh_token(
        &self,
        service: &str,
        owner_scope: Option<&str>,
    ) -> Result<TokenBundle> {
        let lock = self.refresh_lock(owner_scope);
        let _guard = lock.lock().await;

        let rows = self.read_raw_token_rows(owner_scope).await?;
        self.refresh_with_rows(service, owner_scope, rows).await
    }

    /// Refresh unless another caller already replaced `stale_token`.
    ///
    /// Used after an expiry check or a rejected request: while waiting for
    /// the per-scope lock another caller may have rotated the token, in
    /// which case the current valid token is returned as-is.
    ///
    /// # Errors
    /// Same as [`AuthManager::refresh_token`].
    pub async fn refresh_unless_rotated(
        &self,
        service: &str,
        owner_scope: Option<&str>,
        stale_token: Option<&str>,
    ) -> Result<TokenBundle> {
        let lock = self.refresh_lock(owner_scope);
        let _guard = lock.lock().await;

        let rows = self.read_raw_token_rows(owner_scope).await?;
        if let Some(access) = &rows.access {
            let rotated = stale_token.is_some_and(|stale| stale != access.token);
            if rotated && !access.expires_within(self.clock.now(), safety_margin()) {
                debug!("token already rotated by a concurrent refresh");
                return Ok(bundle(access, rows.refresh.as_ref()));
            }
        }

        self.refresh_with_rows(service, owner_scope, rows).await
    }

    /// Revoke the credentials of `owner_scope`.
    ///
    /// The remote revocation is best effort: failures are logged and the
    /// local rows are deactivated regardless.
    ///
    /// # Errors
    /// Propagates repository failures of the read or the local deactivation.
    #[instrument(skip(self), fields(vendor = %self.vendor))]
    pub async fn revoke_token(
        &self,
        service: &str,
        owner_scope: Option<&str>,
    ) -> Result<RevokeOutcome> {
        let rows = self.read_raw_token_rows(owner_scope).await?;

        let remote_revoked = match rows.refresh.as_ref().or(rows.access.as_ref()) {
            Some(row) => match self.oauth.revoke_token(&row.token).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "remote token revocation failed, continuing with local revocation");
                    false
                }
            },
            None => false,
        };

        let deactivated = self.repository.deactivate_scope(&self.vendor, owner_scope).await?;
        info!(remote_revoked, deactivated, "tokens revoked");

        Ok(RevokeOutcome { remote_revoked, deactivated })
    }

    /// Describe the stored credentials without refreshing anything.
    ///
    /// # Errors
    /// Propagates repository failures.
    pub async fn get_token_status(&self, owner_scope: Option<&str>) -> Result<TokenStatus> {
        let rows = self.read_raw_token_rows(owner_scope).await?;
        let now = self.clock.now();

        Ok(TokenStatus {
            has_access_token: rows.access.is_some(),
            has_refresh_token: rows.refresh.is_some(),
            access_expires_at: rows.access.as_ref().and_then(|row| row.expires_at),
            is_expired: rows.access.as_ref().is_some_and(|row| row.is_expired_at(now)),
            service: rows
                .access
                .as_ref()
                .or(rows.refresh.as_ref())
                .and_then(AuthToken::service)
                .map(str::to_string),
            owner_scope: owner_scope.map(str::to_string),
        })
    }

    /// Exchange a one-time authorization code and store the first pair.
    ///
    /// # Errors
    /// Propagates token endpoint and repository failures.
    #[instrument(skip(self, code), fields(vendor = %self.vendor))]
    pub async fn exchange_code_for_tokens(
        &self,
        service: &str,
        code: &str,
        owner_scope: Option<&str>,
    ) -> Result<TokenBundle> {
        let tokens = self.oauth.exchange_code_for_tokens(code).await.map_err(map_oauth_error)?;
        if tokens.refresh_token.is_none() {
            warn!("authorization code exchange returned no refresh token");
        }

        let expires_at = tokens.expires_at(self.clock.now(), DEFAULT_TOKEN_EXPIRES_IN_SECS);
        let rows = self
            .save_token(
                service,
                owner_scope,
                SaveTokenRequest {
                    access_token: tokens.access_token.clone(),
                    refresh_token: tokens.refresh_token.clone(),
                    expires_at: Some(expires_at),
                    metadata: Some(token_metadata(&tokens, self.clock.now())),
                },
            )
            .await?;

        Ok(TokenBundle {
            access_token: tokens.access_token,
            refresh_token: rows.refresh.map(|row| row.token),
            expires_at: Some(expires_at),
            owner_scope: owner_scope.map(str::to_string),
        })
    }

    async fn refresh_with_rows(
        &self,
        service: &str,
        owner_scope: Option<&str>,
        rows: TokenRows,
    ) -> Result<TokenBundle> {
        let refresh = rows.refresh.ok_or(SuiteLinkError::MissingRefreshToken)?;

        let tokens =
            self.oauth.refresh_access_token(&refresh.token).await.map_err(map_oauth_error)?;
        let expires_at = tokens.expires_at(self.clock.now(), DEFAULT_TOKEN_EXPIRES_IN_SECS);

        // Keep the stored refresh token unless the server rotated it.
        let rotated_refresh = tokens.refresh_token.clone().filter(|token| *token != refresh.token);

        let saved = self
            .save_token(
                service,
                owner_scope,
                SaveTokenRequest {
                    access_token: tokens.access_token.clone(),
                    refresh_token: rotated_refresh,
                    expires_at: Some(expires_at),
                    metadata: Some(token_metadata(&tokens, self.clock.now())),
                },
            )
            .await?;

        info!(expires_at = %expires_at, "access token refreshed");
        Ok(TokenBundle {
            access_token: tokens.access_token,
            refresh_token: Some(saved.refresh.map_or(refresh.token, |row| row.token)),
            expires_at: Some(expires_at),
            owner_scope: owner_scope.map(str::to_string),
        })
    }

    fn refresh_lock(&self, owner_scope: Option<&str>) -> Arc<Mutex<()>> {
        self.refresh_locks.entry(owner_scope.map(str::to_string)).or_default().value().clone()
    }

    fn audit_metadata(
        &self,
        service: &str,
        mut metadata: Map<String, Value>,
        action: &str,
    ) -> Map<String, Value> {
        metadata.insert("service".into(), Value::String(service.to_string()));
        metadata.insert("last_action".into(), Value::String(action.to_string()));
        metadata.insert("updated_at".into(), Value::String(self.clock.now().to_rfc3339()));
        metadata
    }
}

const fn safety_margin() -> TimeDelta {
    TimeDelta::seconds(TOKEN_EXPIRY_SAFETY_MARGIN_SECS)
}

fn bundle(access: &AuthToken, refresh: Option<&AuthToken>) -> TokenBundle {
    TokenBundle {
        access_token: access.token.clone(),
        refresh_token: refresh.map(|row| row.token.clone()),
        expires_at: access.expires_at,
        owner_scope: access.owner_scope.clone(),
    }
}

fn token_metadata(tokens: &TokenSet, issued_at: DateTime<Utc>) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("token_type".into(), Value::String(tokens.token_type.clone()));
    if let Some(scope) = &tokens.scope {
        metadata.insert("scope".into(), Value::String(scope.clone()));
    }
    if let Some(api_domain) = &tokens.api_domain {
        metadata.insert("api_domain".into(), Value::String(api_domain.clone()));
    }
    metadata.insert("issued_at".into(), Value::String(issued_at.to_rfc3339()));
    metadata
}

/// Map token endpoint failures onto the domain error taxonomy.
pub fn map_oauth_error(err: OAuthClientError) -> SuiteLinkError {
    match err {
        OAuthClientError::RequestFailed(e) if e.is_timeout() => SuiteLinkError::DeadlineExceeded {
            operation: "token endpoint request".into(),
            after: std::time::Duration::from_secs(30),
        },
        OAuthClientError::RequestFailed(e) => {
            SuiteLinkError::Network(format!("token endpoint unreachable: {e}"))
        }
        OAuthClientError::OAuth(e) => SuiteLinkError::Auth(format!("token endpoint rejected request: {e}")),
        OAuthClientError::Endpoint { status, body } => SuiteLinkError::Vendor { status, body },
        OAuthClientError::ParseError(msg) => {
            SuiteLinkError::Auth(format!("invalid token endpoint response: {msg}"))
        }
        OAuthClientError::NoRefreshToken => SuiteLinkError::MissingRefreshToken,
        OAuthClientError::ConfigError(msg) => SuiteLinkError::Config(msg),
    }
}
