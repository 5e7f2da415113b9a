//! Traits for OAuth token endpoint operations
//!
//! These traits enable dependency injection and testing by abstracting the
//! vendor's accounts server.

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::types::TokenSet;

/// Trait for OAuth client operations
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Exchange a one-time authorization code for the first token pair
    ///
    /// # Errors
    /// Returns error if the exchange fails or the response cannot be parsed
    async fn exchange_code_for_tokens(&self, code: &str) -> Result<TokenSet, OAuthClientError>;

    /// Mint a new access token from a refresh token
    ///
    /// # Errors
    /// Returns error if refresh fails or the token is invalid/revoked
    async fn refresh_access_token(&self, refresh_token: &str)
        -> Result<TokenSet, OAuthClientError>;

    /// Revoke a token at the vendor
    ///
    /// # Errors
    /// Returns error if the revocation request fails
    async fn revoke_token(&self, token: &str) -> Result<(), OAuthClientError>;
}
