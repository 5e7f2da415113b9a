use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use suitelink_domain::SuiteLinkError;
use tracing::debug;

use crate::errors::InfraError;

/// Single-shot transport for vendor API calls.
///
/// Each request is dispatched exactly once. Pacing, deadlines and the
/// retry after a 401 belong to the gateway, which sees every response
/// status untouched.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Client sending `user_agent` on every request.
    ///
    /// Proxies are bypassed when `SUITELINK_DISABLE_PROXY` is set.
    pub fn new(user_agent: &str) -> Result<Self, SuiteLinkError> {
        let mut builder = ReqwestClient::builder().user_agent(user_agent);
        if std::env::var_os("SUITELINK_DISABLE_PROXY").is_some() {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|err| SuiteLinkError::from(InfraError::from(err)))?;
        Ok(Self { client })
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Dispatch the request and hand back whatever the server answered.
    ///
    /// # Errors
    /// `Network` when the request cannot be built or the connection fails.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, SuiteLinkError> {
        let request = builder.build().map_err(|err| SuiteLinkError::from(InfraError::from(err)))?;
        let method = request.method().clone();
        let url = redacted(request.url());

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "vendor responded");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "vendor unreachable");
                Err(SuiteLinkError::from(InfraError::from(err)))
            }
        }
    }
}

/// URL without its query string, which may carry organization identifiers.
fn redacted(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}
