//! Port interfaces for reading from the vendor API

use async_trait::async_trait;
use serde_json::Value;
use suitelink_domain::Result;

/// Read access to the vendor API through the rate-limited gateway
#[async_trait]
pub trait VendorApi: Send + Sync {
    /// GET `endpoint` on `service` and return the normalized envelope
    ///
    /// The returned object always carries a `data` member next to the
    /// original top-level fields.
    async fn get_json(
        &self,
        service: &str,
        endpoint: &str,
        query: &[(String, String)],
        owner_scope: Option<&str>,
    ) -> Result<Value>;
}
