//! Command handlers
//!
//! Each handler runs one operation against an [`AppContext`] and turns the
//! outcome into a status code plus a JSON body. Failures never escape as
//! `Err`; they become a body with `success: false`.

use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Value};
use suitelink_core::EntityKind;
use suitelink_domain::{ReorderJobRequest, ReorderJobResponse, SuiteLinkError};
use tracing::warn;

use crate::context::AppContext;

/// Result of one command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub status: u16,
    pub body: Value,
}

impl CommandOutput {
    fn success<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(mut body) => {
                if let Value::Object(map) = &mut body {
                    map.insert("success".into(), Value::Bool(true));
                }
                Self { status: 200, body }
            }
            Err(err) => Self::failure(&SuiteLinkError::Internal(format!("unserializable output: {err}"))),
        }
    }

    fn failure(err: &SuiteLinkError) -> Self {
        let status = err.http_status();
        if status >= 500 {
            warn!(error = %err, status, "Command failed");
        }
        Self { status, body: json!({ "success": false, "error": err.to_string() }) }
    }

    fn from_result<T: Serialize>(result: Result<T, SuiteLinkError>) -> Self {
        match result {
            Ok(payload) => Self::success(&payload),
            Err(err) => Self::failure(&err),
        }
    }

    pub const fn is_failure(&self) -> bool {
        self.status >= 400
    }
}

/// Run the reorder-level job.
pub async fn run_reorder(ctx: &AppContext, request: ReorderJobRequest) -> CommandOutput {
    let response = ReorderJobResponse::from_outcome(ctx.reorder.run_request(request).await);
    CommandOutput { status: response.status, body: response.body }
}

/// Exchange a one-time authorization code and store the resulting tokens.
///
/// The token values themselves are never echoed.
pub async fn exchange_code(
    ctx: &AppContext,
    service: &str,
    code: &str,
    owner_scope: Option<&str>,
) -> CommandOutput {
    if let Err(err) = ctx.config.vendor.require_oauth_client() {
        return CommandOutput::failure(&err);
    }
    match ctx.auth.exchange_code_for_tokens(service, code, owner_scope).await {
        Ok(bundle) => CommandOutput {
            status: 200,
            body: json!({
                "success": true,
                "hasRefreshToken": bundle.refresh_token.is_some(),
                "expiresAt": bundle.expires_at,
                "ownerScope": bundle.owner_scope,
            }),
        },
        Err(err) => CommandOutput::failure(&err),
    }
}

pub async fn token_status(ctx: &AppContext, owner_scope: Option<&str>) -> CommandOutput {
    CommandOutput::from_result(ctx.auth.get_token_status(owner_scope).await)
}

pub async fn revoke(ctx: &AppContext, service: &str, owner_scope: Option<&str>) -> CommandOutput {
    CommandOutput::from_result(ctx.auth.revoke_token(service, owner_scope).await)
}

/// Mirror one entity kind, named by its snake_case identifier.
pub async fn sync_entity(ctx: &AppContext, entity: &str, owner_scope: Option<&str>) -> CommandOutput {
    let kind = match EntityKind::from_str(entity) {
        Ok(kind) => kind,
        Err(err) => return CommandOutput::failure(&SuiteLinkError::InvalidInput(err)),
    };
    CommandOutput::from_result(ctx.sync_service().sync_entity(kind, owner_scope).await)
}

/// Issue a raw GET through the gateway and return the normalized envelope.
pub async fn get(
    ctx: &AppContext,
    service: &str,
    endpoint: &str,
    query: &[(String, String)],
    owner_scope: Option<&str>,
) -> CommandOutput {
    match ctx.gateway.get(service, endpoint, query, owner_scope).await {
        Ok(body) => CommandOutput { status: 200, body },
        Err(err) => CommandOutput::failure(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_carry_the_error_status() {
        let output = CommandOutput::failure(&SuiteLinkError::InvalidInput("bad".into()));
        assert_eq!(output.status, 400);
        assert!(output.is_failure());
        assert_eq!(output.body["success"], false);
    }

    #[test]
    fn successes_are_flagged_in_the_body() {
        let output = CommandOutput::success(&json!({ "updated": 2 }));
        assert_eq!(output.status, 200);
        assert!(!output.is_failure());
        assert_eq!(output.body["success"], true);
        assert_eq!(output.body["updated"], 2);
    }
}
