//! Scripted OAuth token endpoint

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use suitelink_common::auth::{OAuthClientError, OAuthClientTrait, OAuthError, TokenSet};

pub fn token_set(access: &str, refresh: Option<&str>, expires_in: Option<i64>) -> TokenSet {
    TokenSet {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        token_type: "Bearer".into(),
        expires_in,
        scope: Some("ZohoInventory.fullaccess.all".into()),
        api_domain: Some("https://www.zohoapis.com".into()),
    }
}

/// Answers refreshes with `access-1`, `access-2`, ... and records calls.
#[derive(Default)]
pub struct MockOAuthClient {
    pub refresh_calls: AtomicUsize,
    pub exchange_calls: AtomicUsize,
    pub revoked: Mutex<Vec<String>>,
    rotate_refresh: bool,
    fail_refresh: bool,
    fail_revoke: bool,
    refresh_delay: Option<Duration>,
}

impl MockOAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new refresh token on every refresh
    pub fn rotating(mut self) -> Self {
        self.rotate_refresh = true;
        self
    }

    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn failing_revoke(mut self) -> Self {
        self.fail_revoke = true;
        self
    }

    /// Hold each refresh open long enough for concurrent callers to queue
    pub fn slow(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    async fn exchange_code_for_tokens(&self, code: &str) -> Result<TokenSet, OAuthClientError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if code == "bad-code" {
            return Err(OAuthClientError::OAuth(OAuthError {
                error: "invalid_code".into(),
                error_description: None,
            }));
        }
        Ok(token_set(&format!("access-for-{code}"), Some("refresh-0"), Some(3600)))
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet, OAuthClientError> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_refresh {
            return Err(OAuthClientError::OAuth(OAuthError {
                error: "invalid_grant".into(),
                error_description: Some(format!("refresh token {refresh_token} revoked")),
            }));
        }
        let rotated = self.rotate_refresh.then(|| format!("refresh-{n}"));
        Ok(token_set(&format!("access-{n}"), rotated.as_deref(), Some(3600)))
    }

    async fn revoke_token(&self, token: &str) -> Result<(), OAuthClientError> {
        if self.fail_revoke {
            return Err(OAuthClientError::Endpoint { status: 503, body: "unavailable".into() });
        }
        self.revoked.lock().unwrap().push(token.to_string());
        Ok(())
    }
}
