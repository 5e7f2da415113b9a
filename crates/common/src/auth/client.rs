//! OAuth 2.0 client for the vendor accounts server
//!
//! Handles the three token endpoint interactions:
//! - Authorization code exchange
//! - Token refresh
//! - Token revocation

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::debug;

use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};

/// Error type for OAuth client operations
#[derive(Debug, Error)]
pub enum OAuthClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// OAuth server returned an error payload
    #[error("OAuth error: {0}")]
    OAuth(OAuthError),

    /// Non-2xx response without a parseable OAuth error
    #[error("token endpoint returned HTTP {status}: {body}")]
    Endpoint { status: u16, body: String },

    /// Failed to parse response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No refresh token available
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// OAuth 2.0 client bound to one set of client credentials
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration
    ///
    /// Honors `SUITELINK_DISABLE_PROXY` to bypass system proxies.
    ///
    /// # Examples
    /// ```
    /// use suitelink_common::auth::{OAuthClient, OAuthConfig};
    ///
    /// let config = OAuthConfig::new("https://accounts.zoho.com", "client_id", "secret", None);
    /// let client = OAuthClient::new(config);
    /// ```
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let builder = Client::builder().timeout(std::time::Duration::from_secs(30));
        let builder = if std::env::var_os("SUITELINK_DISABLE_PROXY").is_some() {
            builder.no_proxy()
        } else {
            builder
        };
        let client = builder.build().unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    /// Exchange authorization code for tokens
    ///
    /// # Errors
    /// Returns error if the client credentials are missing, the request
    /// fails, or the server rejects the code.
    pub async fn exchange_code_for_tokens(&self, code: &str) -> Result<TokenSet, OAuthClientError> {
        if code.is_empty() {
            return Err(OAuthClientError::ConfigError("authorization code is empty".to_string()));
        }

        let mut params = self.credential_params("authorization_code")?;
        params.push(("code", code.to_string()));
        if let Some(redirect_uri) = &self.config.redirect_uri {
            params.push(("redirect_uri", redirect_uri.clone()));
        }

        debug!(url = %self.config.token_url(), "exchanging authorization code");
        let response = self.client.post(self.config.token_url()).form(&params).send().await?;
        Self::parse_token_response(response).await
    }

    /// Refresh access token using refresh token
    ///
    /// # Errors
    /// Returns error if no refresh token is provided, the request fails, or
    /// the refresh token is invalid/revoked.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let mut params = self.credential_params("refresh_token")?;
        params.push(("refresh_token", refresh_token.to_string()));

        debug!(url = %self.config.token_url(), "refreshing access token");
        let response = self.client.post(self.config.token_url()).form(&params).send().await?;
        Self::parse_token_response(response).await
    }

    /// Revoke a token at the accounts server
    ///
    /// # Errors
    /// Returns error if the request fails or the server reports an error.
    pub async fn revoke_token(&self, token: &str) -> Result<(), OAuthClientError> {
        let response = self
            .client
            .post(self.config.revoke_url())
            .form(&[("token", token)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Self::error_from_body(status.as_u16(), body));
        }
        // 200 with an error payload is still a failure
        if let Ok(error) = serde_json::from_str::<OAuthError>(&body) {
            return Err(OAuthClientError::OAuth(error));
        }
        Ok(())
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub const fn config(&self) -> &OAuthConfig {
        &self.config
    }

    fn credential_params(
        &self,
        grant_type: &'static str,
    ) -> Result<Vec<(&'static str, String)>, OAuthClientError> {
        if self.config.client_id.is_empty() {
            return Err(OAuthClientError::ConfigError("client_id is not configured".to_string()));
        }
        Ok(vec![
            ("grant_type", grant_type.to_string()),
            ("client_id", self.config.client_id.clone()),
            ("client_secret", self.config.client_secret().to_string()),
        ])
    }

    async fn parse_token_response(response: Response) -> Result<TokenSet, OAuthClientError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::error_from_body(status.as_u16(), body));
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| OAuthClientError::ParseError(e.to_string()))?;
        parsed.into_token_set().map_err(OAuthClientError::OAuth)
    }

    fn error_from_body(status: u16, body: String) -> OAuthClientError {
        match serde_json::from_str::<OAuthError>(&body) {
            Ok(error) => OAuthClientError::OAuth(error),
            Err(_) => OAuthClientError::Endpoint { status, body },
        }
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn exchange_code_for_tokens(&self, code: &str) -> Result<TokenSet, OAuthClientError> {
        self.exchange_code_for_tokens(code).await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.refresh_access_token(refresh_token).await
    }

    async fn revoke_token(&self, token: &str) -> Result<(), OAuthClientError> {
        self.revoke_token(token).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> OAuthClient {
        OAuthClient::new(OAuthConfig::new(
            server.uri(),
            "client-1",
            "secret-1",
            Some("https://app.example.com/callback".to_string()),
        ))
    }

    #[tokio::test]
    async fn exchange_posts_form_encoded_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("client_id=client-1"))
            .and(body_string_contains("client_secret=secret-1"))
            .and(body_string_contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = client_for(&server).exchange_code_for_tokens("abc").await.unwrap();
        assert_eq!(tokens.access_token, "access-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn refresh_posts_refresh_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "access-2", "expires_in": 3600})),
            )
            .mount(&server)
            .await;

        let tokens = client_for(&server).refresh_access_token("refresh-1").await.unwrap();
        assert_eq!(tokens.access_token, "access-2");
        assert!(tokens.refresh_token.is_none());
    }

    #[tokio::test]
    async fn ok_status_with_error_payload_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_code"})))
            .mount(&server)
            .await;

        let err = client_for(&server).refresh_access_token("stale").await.unwrap_err();
        assert!(matches!(err, OAuthClientError::OAuth(ref e) if e.error == "invalid_code"));
    }

    #[tokio::test]
    async fn non_json_failure_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).refresh_access_token("r").await.unwrap_err();
        match err {
            OAuthClientError::Endpoint { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_refresh_token_is_rejected_locally() {
        let server = MockServer::start().await;
        let err = client_for(&server).refresh_access_token("").await.unwrap_err();
        assert!(matches!(err, OAuthClientError::NoRefreshToken));
    }

    #[tokio::test]
    async fn revoke_posts_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token/revoke"))
            .and(body_string_contains("token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).revoke_token("refresh-1").await.unwrap();
    }
}
