//! SQLite-backed implementation of the credential store port.
//!
//! The partial unique index on `auth_tokens` guarantees at most one active
//! row per `(vendor, token_type, owner_scope)`. `save_token_row` runs its
//! lookup, deactivation and write inside one immediate transaction so
//! concurrent writers never observe the tuple without an active row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use suitelink_core::TokenRepository;
use suitelink_domain::{AuthToken, Result as DomainResult, SuiteLinkError, TokenType, TokenWrite};
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use super::columns::{from_millis, json_object, opt_from_millis, to_millis};
use super::manager::DbManager;
use crate::errors::{map_join_error, map_sql_error};

const TOKEN_COLUMNS: &str = "id, vendor, token_type, token, expires_at, owner_scope, metadata, \
                             is_active, description, created_at, updated_at";

/// SQLite-backed token repository.
pub struct SqliteTokenRepository {
    db: Arc<DbManager>,
}

impl SqliteTokenRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn find_active_row(
        conn: &Connection,
        vendor: &str,
        token_type: TokenType,
        owner_scope: Option<&str>,
    ) -> rusqlite::Result<Option<AuthToken>> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM auth_tokens \
             WHERE vendor = ?1 AND token_type = ?2 AND owner_scope IS ?3 AND is_active = 1 \
             ORDER BY updated_at DESC LIMIT 1"
        );
        conn.query_row(&sql, params![vendor, token_type.as_str(), owner_scope], map_token_row)
            .optional()
    }

    fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<AuthToken> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM auth_tokens WHERE id = ?1");
        conn.query_row(&sql, params![id], map_token_row)
    }

    fn save(conn: &mut Connection, write: &TokenWrite) -> DomainResult<AuthToken> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;
        let now = to_millis(Utc::now());
        let token_type = write.token_type.as_str();
        let scope = write.owner_scope.as_deref();
        let metadata = serde_json::to_string(&write.metadata)
            .map_err(|err| SuiteLinkError::Internal(format!("token metadata not serializable: {err}")))?;

        // Look up before deactivating so the row being refreshed is updated
        // in place rather than switched off.
        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM auth_tokens \
                 WHERE vendor = ?1 AND token_type = ?2 AND owner_scope IS ?3 AND is_active = 1 \
                 ORDER BY updated_at DESC LIMIT 1",
                params![write.vendor, token_type, scope],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)?;

        let keep = existing.clone().unwrap_or_default();
        let deactivated = tx
            .execute(
                "UPDATE auth_tokens SET is_active = 0, updated_at = ?4 \
                 WHERE vendor = ?1 AND token_type = ?2 AND owner_scope IS ?3 \
                   AND is_active = 1 AND id <> ?5",
                params![write.vendor, token_type, scope, now, keep],
            )
            .map_err(map_sql_error)?;
        if deactivated > 0 {
            debug!(deactivated, token_type, "deactivated stale active token rows");
        }

        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE auth_tokens \
                     SET token = ?2, expires_at = ?3, metadata = ?4, description = ?5, \
                         is_active = 1, updated_at = ?6 \
                     WHERE id = ?1",
                    params![
                        id,
                        write.token,
                        write.expires_at.map(to_millis),
                        metadata,
                        write.description,
                        now
                    ],
                )
                .map_err(map_sql_error)?;
                id
            }
            None => {
                let id = Uuid::now_v7().to_string();
                tx.execute(
                    "INSERT INTO auth_tokens \
                     (id, vendor, token_type, token, expires_at, owner_scope, metadata, \
                      is_active, description, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9, ?9)",
                    params![
                        id,
                        write.vendor,
                        token_type,
                        write.token,
                        write.expires_at.map(to_millis),
                        scope,
                        metadata,
                        write.description,
                        now
                    ],
                )
                .map_err(map_sql_error)?;
                id
            }
        };

        let saved = Self::find_by_id(&tx, &id).map_err(map_sql_error)?;
        tx.commit().map_err(map_sql_error)?;
        Ok(saved)
    }
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    async fn find_active(
        &self,
        vendor: &str,
        token_type: TokenType,
        owner_scope: Option<&str>,
    ) -> DomainResult<Option<AuthToken>> {
        let db = Arc::clone(&self.db);
        let vendor = vendor.to_string();
        let owner_scope = owner_scope.map(str::to_string);

        task::spawn_blocking(move || -> DomainResult<Option<AuthToken>> {
            let conn = db.get_connection()?;
            Self::find_active_row(&conn, &vendor, token_type, owner_scope.as_deref())
                .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn save_token_row(&self, write: TokenWrite) -> DomainResult<AuthToken> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<AuthToken> {
            let mut conn = db.get_connection()?;
            Self::save(&mut conn, &write)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn deactivate_scope(&self, vendor: &str, owner_scope: Option<&str>) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let vendor = vendor.to_string();
        let owner_scope = owner_scope.map(str::to_string);

        task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE auth_tokens SET is_active = 0, updated_at = ?3 \
                 WHERE vendor = ?1 AND owner_scope IS ?2 AND is_active = 1",
                params![vendor, owner_scope, to_millis(Utc::now())],
            )
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_token_row(row: &Row<'_>) -> rusqlite::Result<AuthToken> {
    let token_type: String = row.get(2)?;
    let token_type = token_type.parse::<TokenType>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, err.into())
    })?;
    let metadata: String = row.get(6)?;
    let is_active: i64 = row.get(7)?;

    Ok(AuthToken {
        id: row.get(0)?,
        vendor: row.get(1)?,
        token_type,
        token: row.get(3)?,
        expires_at: opt_from_millis(4, row.get(4)?)?,
        owner_scope: row.get(5)?,
        metadata: json_object(6, &metadata)?,
        is_active: is_active != 0,
        description: row.get(8)?,
        created_at: from_millis(9, row.get(9)?)?,
        updated_at: from_millis(10, row.get(10)?)?,
    })
}
