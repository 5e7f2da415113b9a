//! Gateway behaviour against mock vendor and accounts servers

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use serde_json::json;
use suitelink_common::auth::{OAuthClient, OAuthConfig};
use suitelink_core::AuthManager;
use suitelink_domain::{Config, SaveTokenRequest, SuiteLinkError};
use suitelink_infra::{ApiGateway, DbManager, SqliteTokenRepository};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    _dir: TempDir,
    api: MockServer,
    accounts: MockServer,
    auth: Arc<AuthManager>,
    gateway: ApiGateway,
}

async fn harness(static_token: Option<&str>) -> Harness {
    std::env::set_var("SUITELINK_DISABLE_PROXY", "1");
    let api = MockServer::start().await;
    let accounts = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let db = Arc::new(DbManager::new(dir.path().join("gateway.db"), 2).unwrap());
    db.run_migrations().unwrap();

    let mut config = Config::default();
    config.gateway.min_interval_ms = 1;
    config.gateway.request_timeout_secs = 5;
    config.vendor.accounts_url = accounts.uri();
    config.vendor.client_id = "cid".into();
    config.vendor.client_secret = "secret".into();
    config.vendor.organization_id = Some("600".into());
    config.vendor.static_access_token = static_token.map(str::to_string);
    config.vendor.services.insert("inventory".into(), format!("{}/inventory/v1", api.uri()));

    let oauth = OAuthClient::new(OAuthConfig::new(accounts.uri(), "cid", "secret", None));
    let auth = Arc::new(AuthManager::new(
        Arc::new(SqliteTokenRepository::new(db)),
        Arc::new(oauth),
    ));
    let gateway = ApiGateway::from_config(&config, Arc::clone(&auth)).unwrap();

    Harness { _dir: dir, api, accounts, auth, gateway }
}

impl Harness {
    async fn seed(&self, access: &str, refresh: Option<&str>) {
        self.auth
            .save_token(
                "inventory",
                None,
                SaveTokenRequest {
                    access_token: access.into(),
                    refresh_token: refresh.map(str::to_string),
                    expires_at: Some(Utc::now() + TimeDelta::hours(1)),
                    metadata: None,
                },
            )
            .await
            .unwrap();
    }

    async fn token_endpoint_returns(&self, access: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access,
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(times)
            .mount(&self.accounts)
            .await;
    }
}

fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

#[tokio::test]
async fn get_sends_scheme_header_and_organization() {
    let h = harness(None).await;
    h.seed("live", Some("r")).await;

    Mock::given(method("GET"))
        .and(path("/inventory/v1/items"))
        .and(header("authorization", "Zoho-oauthtoken live"))
        .and(query_param("organization_id", "600"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "items": [{"item_id": "1"}],
            "page_context": {"has_more_page": false}
        })))
        .expect(1)
        .mount(&h.api)
        .await;

    let value = h.gateway.get("inventory", "items", &query(&[("page", "2")]), None).await.unwrap();

    assert_eq!(value["data"][0]["item_id"], "1");
    assert_eq!(value["code"], 0);
    assert_eq!(value["page_context"]["has_more_page"], false);
}

#[tokio::test]
async fn unauthorized_response_refreshes_once_and_retries() {
    let h = harness(None).await;
    h.seed("stale", Some("r1")).await;
    h.token_endpoint_returns("fresh", 1).await;

    Mock::given(method("GET"))
        .and(header("authorization", "Zoho-oauthtoken stale"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .expect(1)
        .mount(&h.api)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Zoho-oauthtoken fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(2)
        .mount(&h.api)
        .await;

    let value = h.gateway.get("inventory", "items", &[], None).await.unwrap();
    assert_eq!(value["data"], json!([]));

    let rows = h.auth.read_raw_token_rows(None).await.unwrap();
    assert_eq!(rows.access.unwrap().token, "fresh");
    assert_eq!(rows.refresh.unwrap().token, "r1");

    // The refreshed token is cached; no second refresh.
    h.gateway.get("inventory", "items", &[], None).await.unwrap();
}

#[tokio::test]
async fn second_unauthorized_is_returned_to_the_caller() {
    let h = harness(None).await;
    h.seed("stale", Some("r1")).await;
    h.token_endpoint_returns("still-bad", 1).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid oauth token"))
        .expect(2)
        .mount(&h.api)
        .await;

    let err = h.gateway.get("inventory", "items", &[], None).await.unwrap_err();
    match err {
        SuiteLinkError::Vendor { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid oauth token");
        }
        other => panic!("expected vendor error, got {other:?}"),
    }
}

#[tokio::test]
async fn static_token_covers_an_empty_store() {
    let h = harness(Some("deploy-token")).await;

    Mock::given(method("GET"))
        .and(header("authorization", "Zoho-oauthtoken deploy-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&h.api)
        .await;

    let value = h.gateway.get("inventory", "items", &[], None).await.unwrap();
    assert_eq!(value["data"][0]["id"], 1);
}

#[tokio::test]
async fn missing_token_without_fallback_is_an_auth_error() {
    let h = harness(None).await;
    let err = h.gateway.get("inventory", "items", &[], None).await.unwrap_err();
    assert!(matches!(err, SuiteLinkError::Auth(_)));
}

#[tokio::test]
async fn vendor_errors_embed_status_and_body() {
    let h = harness(None).await;
    h.seed("live", None).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"code":1,"message":"boom"}"#))
        .mount(&h.api)
        .await;

    let err = h.gateway.get("inventory", "items/7", &[], None).await.unwrap_err();
    assert!(matches!(err, SuiteLinkError::Vendor { status: 500, ref body } if body.contains("boom")));
}

#[tokio::test]
async fn slow_responses_exceed_the_deadline() {
    let h = harness(None).await;
    h.seed("live", None).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&h.api)
        .await;

    let gateway = h.gateway.with_timeout(Duration::from_millis(200));
    let err = gateway.get("inventory", "items", &[], None).await.unwrap_err();
    assert!(matches!(err, SuiteLinkError::DeadlineExceeded { .. }));
}

#[tokio::test]
async fn unknown_service_is_invalid_input() {
    let h = harness(Some("deploy-token")).await;
    let err = h.gateway.get("payroll", "employees", &[], None).await.unwrap_err();
    assert!(matches!(err, SuiteLinkError::InvalidInput(_)));
}

#[tokio::test]
async fn post_and_delete_normalize_their_envelopes() {
    let h = harness(None).await;
    h.seed("live", None).await;

    Mock::given(method("POST"))
        .and(path("/inventory/v1/items"))
        .and(body_json(json!({"name": "Bolt"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "code": 0,
            "item": {"item_id": "5", "name": "Bolt"}
        })))
        .expect(1)
        .mount(&h.api)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/inventory/v1/items/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.api)
        .await;

    let created = h.gateway.post("inventory", "items", json!({"name": "Bolt"}), None).await.unwrap();
    assert_eq!(created["data"]["item_id"], "5");

    let deleted = h.gateway.delete("inventory", "items/5", None).await.unwrap();
    assert!(deleted["data"].is_null());
}
