//! Rate-limited, authenticated gateway to the vendor REST APIs
//!
//! Every call passes the shared [`RateLimiter`], resolves an access token
//! cache-first (falling back to the token store, then to a statically
//! configured token), and retries exactly once after forcing a refresh when
//! the vendor answers 401.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_json::Value;
use suitelink_common::RateLimiter;
use suitelink_core::{AuthManager, CachedToken, InMemoryTokenCache, TokenCache, VendorApi};
use suitelink_domain::{Config, Result, SuiteLinkError, TokenBundle, VendorConfig};
use tracing::{debug, info, instrument, warn};

use super::envelope;
use crate::http::HttpClient;

/// Request method, query and body for [`ApiGateway::request`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn get(query: &[(String, String)]) -> Self {
        Self { method: Method::GET, query: query.to_vec(), body: None }
    }

    pub fn with_body(method: Method, body: Value) -> Self {
        Self { method, query: Vec::new(), body: Some(body) }
    }
}

/// Raw vendor response as returned by [`ApiGateway::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

impl GatewayResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Gateway to the vendor sub-services
pub struct ApiGateway {
    http: HttpClient,
    limiter: Arc<RateLimiter>,
    auth: Arc<AuthManager>,
    cache: Arc<dyn TokenCache>,
    vendor: VendorConfig,
    request_timeout: Duration,
}

impl ApiGateway {
    /// Build a gateway from configuration with its own limiter and cache.
    ///
    /// # Errors
    /// Returns `Config` when the rate limiter settings are invalid and
    /// propagates HTTP client construction failures.
    pub fn from_config(config: &Config, auth: Arc<AuthManager>) -> Result<Self> {
        let limiter = RateLimiter::new(Duration::from_millis(config.gateway.min_interval_ms))
            .map_err(SuiteLinkError::Config)?;
        let http = HttpClient::new(&config.gateway.user_agent)?;

        Ok(Self {
            http,
            limiter: Arc::new(limiter),
            auth,
            cache: Arc::new(InMemoryTokenCache::new()),
            vendor: config.vendor.clone(),
            request_timeout: Duration::from_secs(config.gateway.request_timeout_secs),
        })
    }

    /// Share a limiter with other gateways in the same process.
    #[must_use]
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Shared rate limiter
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Issue an authenticated request and return the raw response.
    ///
    /// A 401 forces one refresh and one retry; a second 401 is returned
    /// as-is.
    ///
    /// # Errors
    /// Returns `InvalidInput` for an unknown service, `Auth` when no token
    /// can be resolved, `DeadlineExceeded` when the call outlives the
    /// configured timeout, and transport failures as `Network`.
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request(
        &self,
        service: &str,
        endpoint: &str,
        options: &RequestOptions,
        owner_scope: Option<&str>,
    ) -> Result<GatewayResponse> {
        let url = self.endpoint_url(service, endpoint)?;

        self.limiter.acquire().await;
        let token = self.resolve_token(service, owner_scope).await?;
        let response = self.send(&url, options, &token).await?;
        if response.status != 401 {
            return Ok(response);
        }

        info!("vendor rejected access token, refreshing and retrying once");
        self.cache.invalidate(owner_scope);
        let refreshed = match self.auth.refresh_unless_rotated(service, owner_scope, Some(&token)).await {
            Ok(bundle) => bundle,
            Err(err) => {
                warn!(error = %err, "forced refresh failed, returning the rejected response");
                return Ok(response);
            }
        };
        self.cache_bundle(owner_scope, &refreshed);

        self.limiter.acquire().await;
        self.send(&url, options, &refreshed.access_token).await
    }

    /// GET with envelope normalization.
    ///
    /// # Errors
    /// Non-2xx responses become `Vendor { status, body }`.
    pub async fn get(
        &self,
        service: &str,
        endpoint: &str,
        query: &[(String, String)],
        owner_scope: Option<&str>,
    ) -> Result<Value> {
        let response = self.request(service, endpoint, &RequestOptions::get(query), owner_scope).await?;
        into_envelope(endpoint, response)
    }

    /// POST a JSON body with envelope normalization.
    ///
    /// # Errors
    /// Non-2xx responses become `Vendor { status, body }`.
    pub async fn post(
        &self,
        service: &str,
        endpoint: &str,
        body: Value,
        owner_scope: Option<&str>,
    ) -> Result<Value> {
        let options = RequestOptions::with_body(Method::POST, body);
        let response = self.request(service, endpoint, &options, owner_scope).await?;
        into_envelope(endpoint, response)
    }

    /// PUT a JSON body with envelope normalization.
    ///
    /// # Errors
    /// Non-2xx responses become `Vendor { status, body }`.
    pub async fn put(
        &self,
        service: &str,
        endpoint: &str,
        body: Value,
        owner_scope: Option<&str>,
    ) -> Result<Value> {
        let options = RequestOptions::with_body(Method::PUT, body);
        let response = self.request(service, endpoint, &options, owner_scope).await?;
        into_envelope(endpoint, response)
    }

    /// DELETE with envelope normalization.
    ///
    /// # Errors
    /// Non-2xx responses become `Vendor { status, body }`.
    pub async fn delete(&self, service: &str, endpoint: &str, owner_scope: Option<&str>) -> Result<Value> {
        let options = RequestOptions { method: Method::DELETE, query: Vec::new(), body: None };
        let response = self.request(service, endpoint, &options, owner_scope).await?;
        into_envelope(endpoint, response)
    }

    fn endpoint_url(&self, service: &str, endpoint: &str) -> Result<String> {
        let base = self
            .vendor
            .service_url(service)
            .ok_or_else(|| SuiteLinkError::InvalidInput(format!("unknown vendor service: {service}")))?;
        Ok(format!("{}/{}", base.trim_end_matches('/'), endpoint.trim_start_matches('/')))
    }

    /// Cache first, then the token store, then the deployment token.
    async fn resolve_token(&self, service: &str, owner_scope: Option<&str>) -> Result<String> {
        if let Some(cached) = self.cache.get(owner_scope) {
            return Ok(cached.access_token);
        }

        let failure = match self.auth.get_token(service, owner_scope).await {
            Ok(Some(bundle)) => {
                self.cache_bundle(owner_scope, &bundle);
                return Ok(bundle.access_token);
            }
            Ok(None) => SuiteLinkError::Auth(format!("no access token stored for {service}")),
            Err(err) => {
                warn!(error = %err, "token lookup failed");
                err
            }
        };

        match &self.vendor.static_access_token {
            Some(token) if !token.trim().is_empty() => {
                debug!("using statically configured access token");
                Ok(token.clone())
            }
            _ => Err(failure),
        }
    }

    fn cache_bundle(&self, owner_scope: Option<&str>, bundle: &TokenBundle) {
        self.cache.set(
            owner_scope,
            CachedToken {
                access_token: bundle.access_token.clone(),
                expires_at_millis: bundle.expires_at.map(|at| at.timestamp_millis()),
            },
        );
    }

    async fn send(&self, url: &str, options: &RequestOptions, token: &str) -> Result<GatewayResponse> {
        let mut builder = self
            .http
            .request(options.method.clone(), url)
            .header(AUTHORIZATION, format!("{} {token}", self.vendor.auth_scheme));

        let mut query = options.query.clone();
        if let Some(org) = &self.vendor.organization_id {
            if !query.iter().any(|(key, _)| key == "organization_id") {
                query.push(("organization_id".into(), org.clone()));
            }
        }
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let call = async {
            let response = self.http.send(builder).await?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|err| SuiteLinkError::Network(format!("failed to read response body: {err}")))?;
            Ok::<_, SuiteLinkError>(GatewayResponse { status, body })
        };

        tokio::time::timeout(self.request_timeout, call).await.map_err(|_| {
            SuiteLinkError::DeadlineExceeded {
                operation: format!("{} {}", options.method, strip_query(url)),
                after: self.request_timeout,
            }
        })?
    }
}

#[async_trait]
impl VendorApi for ApiGateway {
    async fn get_json(
        &self,
        service: &str,
        endpoint: &str,
        query: &[(String, String)],
        owner_scope: Option<&str>,
    ) -> Result<Value> {
        self.get(service, endpoint, query, owner_scope).await
    }
}

fn into_envelope(endpoint: &str, response: GatewayResponse) -> Result<Value> {
    if !response.is_success() {
        return Err(SuiteLinkError::Vendor { status: response.status, body: response.body });
    }
    match envelope::normalize(endpoint, &response.body) {
        Some(value) => Ok(value),
        None => Err(SuiteLinkError::Vendor { status: response.status, body: response.body }),
    }
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_success_responses_become_vendor_errors() {
        let err = into_envelope("items", GatewayResponse { status: 404, body: "missing".into() })
            .unwrap_err();
        assert!(matches!(err, SuiteLinkError::Vendor { status: 404, ref body } if body == "missing"));
    }

    #[test]
    fn invalid_json_keeps_the_raw_body() {
        let err = into_envelope("items", GatewayResponse { status: 200, body: "<html/>".into() })
            .unwrap_err();
        assert!(matches!(err, SuiteLinkError::Vendor { status: 200, .. }));
    }

    #[test]
    fn no_content_normalizes_to_null_data() {
        let value = into_envelope("items/1", GatewayResponse { status: 204, body: String::new() }).unwrap();
        assert!(value["data"].is_null());
    }
}
