//! Error types used throughout the integration core

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Diagnostic payload attached to failures of the persistence layer.
///
/// Mirrors the fields relational stores usually report (`code`, `details`,
/// `hint`) so a caller that aborts a batch job can surface them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PersistenceFailure {
    pub message: String,
    pub code: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl PersistenceFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for PersistenceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code {code})")?;
        }
        if let Some(details) = &self.details {
            write!(f, "; details: {details}")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "; hint: {hint}")?;
        }
        Ok(())
    }
}

/// Main error type for SuiteLink
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SuiteLinkError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("no refresh token available")]
    MissingRefreshToken,

    #[error("Vendor API error (HTTP {status}): {body}")]
    Vendor { status: u16, body: String },

    #[error("{operation} exceeded its deadline of {after:?}")]
    DeadlineExceeded { operation: String, after: Duration },

    #[error("Persistence failure: {0}")]
    Persistence(PersistenceFailure),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SuiteLinkError {
    /// Wrap any error as a fatal persistence failure, prefixing `context`.
    ///
    /// Diagnostic fields of an existing [`PersistenceFailure`] are preserved.
    #[must_use]
    pub fn fatal(context: &str, source: Self) -> Self {
        match source {
            Self::Persistence(failure) => Self::Persistence(PersistenceFailure {
                message: format!("{context}: {}", failure.message),
                ..failure
            }),
            other => Self::Persistence(PersistenceFailure::new(format!("{context}: {other}"))),
        }
    }

    /// Whether this error aborts a batch job rather than being reported per row.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Database(_))
    }

    /// HTTP-equivalent status a job wrapper reports for this error.
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Auth(_) | Self::MissingRefreshToken => 401,
            Self::NotFound(_) => 404,
            Self::Vendor { .. } | Self::Network(_) => 502,
            Self::DeadlineExceeded { .. } => 504,
            Self::Database(_)
            | Self::Persistence(_)
            | Self::Config(_)
            | Self::Internal(_) => 500,
        }
    }
}

/// Result type alias for SuiteLink operations
pub type Result<T> = std::result::Result<T, SuiteLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_keeps_diagnostics_of_persistence_failures() {
        let source = SuiteLinkError::Persistence(
            PersistenceFailure::new("no such table: sales_orders")
                .with_code("SQLITE_ERROR")
                .with_hint("run migrations"),
        );

        let SuiteLinkError::Persistence(failure) =
            SuiteLinkError::fatal("querying sales orders", source)
        else {
            panic!("expected persistence failure");
        };

        assert_eq!(failure.message, "querying sales orders: no such table: sales_orders");
        assert_eq!(failure.code.as_deref(), Some("SQLITE_ERROR"));
        assert_eq!(failure.hint.as_deref(), Some("run migrations"));
    }

    #[test]
    fn fatal_wraps_other_variants() {
        let err = SuiteLinkError::fatal("loading", SuiteLinkError::Network("refused".into()));
        assert!(err.is_fatal());
        assert_eq!(err.http_status(), 500);
        assert!(err.to_string().contains("loading: Network error: refused"));
    }

    #[test]
    fn vendor_errors_embed_status_and_body() {
        let err = SuiteLinkError::Vendor { status: 404, body: "{\"code\":5}".into() };
        assert_eq!(err.to_string(), "Vendor API error (HTTP 404): {\"code\":5}");
        assert!(!err.is_fatal());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(SuiteLinkError::InvalidInput("bad".into())).unwrap();
        assert_eq!(json["type"], "InvalidInput");
        assert_eq!(json["message"], "bad");
    }
}
