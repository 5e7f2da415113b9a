//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use suitelink_common::storage::StorageError;
use suitelink_domain::{PersistenceFailure, SuiteLinkError};
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SuiteLinkError);

impl From<InfraError> for SuiteLinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SuiteLinkError> for InfraError {
    fn from(value: SuiteLinkError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSuiteLinkError {
    fn into_suitelink(self) -> SuiteLinkError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SuiteLinkError */
/* -------------------------------------------------------------------------- */

impl IntoSuiteLinkError for SqlError {
    fn into_suitelink(self) -> SuiteLinkError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_else(|| err.to_string());
                let failure = PersistenceFailure::new(message.clone())
                    .with_code(format!("SQLITE_{}", err.extended_code));
                let failure = match err.code {
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => failure
                        .with_details("database is busy or locked")
                        .with_hint("retry once the competing writer has finished"),
                    ErrorCode::ConstraintViolation => failure.with_details(message),
                    ErrorCode::Unknown if message.contains("no such table") => {
                        failure.with_hint("run the schema migrations before starting the job")
                    }
                    ErrorCode::CannotOpen => {
                        failure.with_hint("check database.path and its directory permissions")
                    }
                    _ => failure,
                };
                SuiteLinkError::Persistence(failure)
            }
            RE::QueryReturnedNoRows => SuiteLinkError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                SuiteLinkError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                SuiteLinkError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidParameterName(parameter_name) => {
                SuiteLinkError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => SuiteLinkError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => SuiteLinkError::Database("invalid SQL query".into()),
            other => SuiteLinkError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_suitelink())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → SuiteLinkError */
/* -------------------------------------------------------------------------- */

impl IntoSuiteLinkError for StorageError {
    fn into_suitelink(self) -> SuiteLinkError {
        match self {
            StorageError::Rusqlite(err) => err.into_suitelink(),
            StorageError::R2d2(err) => SuiteLinkError::Persistence(
                PersistenceFailure::new(format!("connection pool exhausted: {err}"))
                    .with_code("POOL_TIMEOUT")
                    .with_hint("increase database.pool_size or reduce concurrent jobs"),
            ),
            StorageError::Timeout(secs) => SuiteLinkError::Persistence(
                PersistenceFailure::new(format!("connection timeout after {secs}s"))
                    .with_code("POOL_TIMEOUT"),
            ),
            StorageError::InvalidConfig(message) => SuiteLinkError::Config(message),
            other => SuiteLinkError::Database(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        Self(value.into_suitelink())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SuiteLinkError */
/* -------------------------------------------------------------------------- */

impl IntoSuiteLinkError for HttpError {
    fn into_suitelink(self) -> SuiteLinkError {
        if self.is_timeout() {
            return SuiteLinkError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return SuiteLinkError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => SuiteLinkError::Auth(message),
                404 => SuiteLinkError::NotFound(message),
                _ => SuiteLinkError::Vendor { status: code, body: message },
            };
        }

        if self.is_builder() {
            return SuiteLinkError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        SuiteLinkError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_suitelink())
    }
}

/* -------------------------------------------------------------------------- */
/* Helpers */
/* -------------------------------------------------------------------------- */

pub(crate) fn map_sql_error(err: SqlError) -> SuiteLinkError {
    SuiteLinkError::from(InfraError::from(err))
}

pub(crate) fn map_storage_error(err: StorageError) -> SuiteLinkError {
    SuiteLinkError::from(InfraError::from(err))
}

pub(crate) fn map_join_error(err: JoinError) -> SuiteLinkError {
    if err.is_cancelled() {
        SuiteLinkError::Internal("blocking task cancelled".into())
    } else {
        SuiteLinkError::Internal(format!("blocking task failed: {err}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
