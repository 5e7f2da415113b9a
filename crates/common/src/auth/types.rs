//! OAuth 2.0 types and structures

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Tokens granted by the vendor's token endpoint
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenSet {
    /// Bearer credential for API calls
    pub access_token: String,

    /// Long-lived credential; only present on code exchange or when rotated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type reported by the server (usually "Bearer")
    pub token_type: String,

    /// Access token lifetime in seconds, when the server reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Granted scopes (space or comma separated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Data-center specific API host returned alongside the tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_domain: Option<String>,
}

impl TokenSet {
    /// Absolute expiry relative to `issued_at`.
    ///
    /// Falls back to `default_secs` when the server omitted `expires_in` or
    /// reported a non-positive value.
    #[must_use]
    pub fn expires_at(&self, issued_at: DateTime<Utc>, default_secs: i64) -> DateTime<Utc> {
        let secs = self.expires_in.filter(|secs| *secs > 0).unwrap_or(default_secs);
        issued_at + TimeDelta::seconds(secs)
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("api_domain", &self.api_domain)
            .finish()
    }
}

/// Raw token endpoint payload
///
/// The vendor answers some failures with HTTP 200 and an `error` field, so
/// every field is optional and [`TokenResponse::into_token_set`] decides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub api_domain: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Convert into a [`TokenSet`], surfacing embedded OAuth errors.
    ///
    /// # Errors
    /// Returns the embedded [`OAuthError`] or `missing_access_token` when the
    /// payload carries no usable access token.
    pub fn into_token_set(self) -> Result<TokenSet, OAuthError> {
        if let Some(error) = self.error {
            return Err(OAuthError { error, error_description: self.error_description });
        }
        let access_token = self.access_token.filter(|token| !token.is_empty()).ok_or_else(|| {
            OAuthError {
                error: "missing_access_token".to_string(),
                error_description: Some("token endpoint returned no access_token".to_string()),
            }
        })?;

        Ok(TokenSet {
            access_token,
            refresh_token: self.refresh_token.filter(|token| !token.is_empty()),
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_in: self.expires_in,
            scope: self.scope,
            api_domain: self.api_domain,
        })
    }
}

/// Client credentials and endpoints of the vendor accounts server
#[derive(Clone)]
pub struct OAuthConfig {
    /// Accounts server base URL, e.g. `https://accounts.zoho.com`
    pub accounts_url: String,
    pub client_id: String,
    client_secret: String,
    pub redirect_uri: Option<String>,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(
        accounts_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Option<String>,
    ) -> Self {
        Self {
            accounts_url: accounts_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
        }
    }

    /// Token endpoint (code exchange and refresh)
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oauth/v2/token", self.accounts_url.trim_end_matches('/'))
    }

    /// Revocation endpoint
    #[must_use]
    pub fn revoke_url(&self) -> String {
        format!("{}/oauth/v2/token/revoke", self.accounts_url.trim_end_matches('/'))
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("accounts_url", &self.accounts_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// OAuth error payload (`error`, `error_description`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}
