//! Port interfaces for token persistence

use async_trait::async_trait;
use suitelink_domain::{AuthToken, Result, TokenType, TokenWrite};

/// Trait for the credential store
///
/// Implementations must keep at most one active row per
/// `(vendor, token_type, owner_scope)`.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Get the active row for a tuple, if any
    async fn find_active(
        &self,
        vendor: &str,
        token_type: TokenType,
        owner_scope: Option<&str>,
    ) -> Result<Option<AuthToken>>;

    /// Persist a token for its tuple
    ///
    /// Looks up an existing row for the tuple first, deactivates every other
    /// active row of the tuple, then updates the found row in place or
    /// inserts a new one. The three steps run atomically.
    async fn save_token_row(&self, write: TokenWrite) -> Result<AuthToken>;

    /// Deactivate every active row (both types) of a vendor and owner scope
    ///
    /// Returns the number of rows switched to inactive.
    async fn deactivate_scope(&self, vendor: &str, owner_scope: Option<&str>) -> Result<usize>;
}
