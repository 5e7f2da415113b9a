//! Command handlers against a temporary database and a mock vendor

use serde_json::json;
use suitelink_app::{commands, AppContext};
use suitelink_domain::{Config, ReorderJobRequest};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn context(dir: &TempDir, api: Option<&MockServer>) -> AppContext {
    std::env::set_var("SUITELINK_DISABLE_PROXY", "1");
    let mut config = Config::default();
    config.database.path = dir.path().join("app.db").to_string_lossy().into_owned();
    config.gateway.min_interval_ms = 1;
    if let Some(api) = api {
        config.vendor.accounts_url = api.uri();
        config.vendor.client_id = "cid".into();
        config.vendor.client_secret = "secret".into();
        config.vendor.static_access_token = Some("deploy-token".into());
        config.vendor.services.insert("inventory".into(), format!("{}/inventory/v1", api.uri()));
    }
    AppContext::new(config).unwrap()
}

#[tokio::test]
async fn reorder_on_an_empty_database_succeeds() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, None);

    let output = commands::run_reorder(&ctx, ReorderJobRequest::default()).await;
    assert_eq!(output.status, 200);
    assert_eq!(output.body["success"], true);
    assert_eq!(output.body["updated"], 0);
}

#[tokio::test]
async fn invalid_reorder_parameters_are_rejected() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, None);

    let request = ReorderJobRequest { look_back_days: Some(-1.0), inventory_turnover_days: None };
    let output = commands::run_reorder(&ctx, request).await;
    assert_eq!(output.status, 400);
    assert!(output.is_failure());
}

#[tokio::test]
async fn token_status_reports_an_empty_store() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, None);

    let output = commands::token_status(&ctx, Some("org-1")).await;
    assert_eq!(output.status, 200);
    assert_eq!(output.body["has_access_token"], false);
    assert_eq!(output.body["owner_scope"], "org-1");
}

#[tokio::test]
async fn exchange_code_stores_tokens_without_echoing_them() {
    let dir = TempDir::new().unwrap();
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-secret",
            "refresh_token": "refresh-secret",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&api)
        .await;
    let ctx = context(&dir, Some(&api));

    let output = commands::exchange_code(&ctx, "inventory", "one-time", None).await;
    assert_eq!(output.status, 200);
    assert_eq!(output.body["hasRefreshToken"], true);
    assert!(!output.body.to_string().contains("secret"));

    let status = commands::token_status(&ctx, None).await;
    assert_eq!(status.body["has_access_token"], true);
    assert_eq!(status.body["has_refresh_token"], true);
}

#[tokio::test]
async fn exchange_code_requires_client_credentials() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, None);

    let output = commands::exchange_code(&ctx, "inventory", "one-time", None).await;
    assert!(output.is_failure());
    assert!(output.body["error"].as_str().unwrap().contains("client_id"));
}

#[tokio::test]
async fn sync_rejects_unknown_entities() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, None);

    let output = commands::sync_entity(&ctx, "spaceship", None).await;
    assert_eq!(output.status, 400);
}

#[tokio::test]
async fn sync_and_get_go_through_the_gateway() {
    let dir = TempDir::new().unwrap();
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inventory/v1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"item_id": "100", "sku": "X", "name": "Widget"}],
            "page_context": {"has_more_page": false}
        })))
        .mount(&api)
        .await;
    let ctx = context(&dir, Some(&api));

    let output = commands::sync_entity(&ctx, "item", None).await;
    assert_eq!(output.status, 200);
    assert_eq!(output.body["stored"], 1);

    let output = commands::get(&ctx, "inventory", "items", &[], None).await;
    assert_eq!(output.body["data"][0]["sku"], "X");
}

#[tokio::test]
async fn gateway_failures_map_to_error_statuses() {
    let dir = TempDir::new().unwrap();
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such item"))
        .mount(&api)
        .await;
    let ctx = context(&dir, Some(&api));

    let output = commands::get(&ctx, "inventory", "items/1", &[], None).await;
    assert!(output.is_failure());
    assert_eq!(output.body["success"], false);
}
