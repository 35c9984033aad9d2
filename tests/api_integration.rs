//! API integration tests
//!
//! Create and stats endpoints: request/response shapes and error mapping.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{json, Value};
use shortlink::api;
use shortlink::clock::ManualClock;
use shortlink::config::LinkConfig;
use shortlink::geo::GeoResolver;
use shortlink::service::RedirectService;
use shortlink::storage::{SqliteStorage, Storage};
use std::sync::Arc;
use tower::ServiceExt;

const BASE_URL: &str = "http://sho.rt";

async fn create_test_app() -> (Router, Arc<RedirectService>) {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    let storage: Arc<dyn Storage> = Arc::new(storage);

    let service = Arc::new(RedirectService::new(
        storage,
        GeoResolver::disabled(),
        Arc::new(ManualClock::new(Utc::now())),
        LinkConfig::default(),
    ));

    // Trailing slash is normalised away
    let router = api::create_api_router(Arc::clone(&service), "http://sho.rt/");
    (router, service)
}

async fn post_json(router: &Router, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/shorturls")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    send(router, request).await
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_create_returns_short_link_and_expiry() {
    let (router, service) = create_test_app().await;

    let (status, body) = post_json(
        &router,
        json!({ "url": "https://example.com/page", "validity": 15, "shortcode": "page15" })
            .to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["shortLink"], format!("{BASE_URL}/page15"));

    let expiry: DateTime<Utc> = body["expiry"].as_str().unwrap().parse().unwrap();
    let stored = service.stats("page15").await.unwrap();
    assert_eq!(expiry, stored.link.expiry);
    assert_eq!(expiry - stored.link.created_at, TimeDelta::minutes(15));
}

#[tokio::test]
async fn test_create_with_generated_code() {
    let (router, _service) = create_test_app().await;

    let (status, body) =
        post_json(&router, json!({ "url": "https://example.com" }).to_string()).await;

    assert_eq!(status, StatusCode::CREATED);
    let link = body["shortLink"].as_str().unwrap();
    let code = link.strip_prefix(&format!("{BASE_URL}/")).unwrap();
    assert_eq!(code.len(), 7);
}

#[tokio::test]
async fn test_create_invalid_url() {
    let (router, _service) = create_test_app().await;

    let (status, body) = post_json(&router, json!({ "url": "not a url" }).to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid URL format"));
}

#[tokio::test]
async fn test_create_invalid_validity() {
    let (router, _service) = create_test_app().await;

    let (status, body) = post_json(
        &router,
        json!({ "url": "https://example.com", "validity": 0 }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Validity"));
}

#[tokio::test]
async fn test_create_duplicate_shortcode() {
    let (router, _service) = create_test_app().await;
    let payload = json!({ "url": "https://example.com", "shortcode": "abc123" }).to_string();

    let (status, _) = post_json(&router, payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(&router, payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("abc123"));
}

#[tokio::test]
async fn test_create_malformed_body() {
    let (router, _service) = create_test_app().await;

    let (status, body) = post_json(&router, "{ not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, _) = post_json(&router, json!({ "validity": 5 }).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_reports_clicks_in_order() {
    let (router, service) = create_test_app().await;
    service
        .create("https://example.com/stats", Some(30), Some("stats"))
        .await
        .unwrap();
    service
        .resolve("stats", Some("https://first.example"), None)
        .await
        .unwrap();
    service.resolve("stats", None, None).await.unwrap();

    let (status, body) = get_json(&router, "/shorturls/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["originalUrl"], "https://example.com/stats");
    assert_eq!(body["clicks"], 2);
    assert!(body["createdAt"].is_string());
    assert!(body["expiry"].is_string());

    let clicks = body["clickData"].as_array().unwrap();
    assert_eq!(clicks.len(), 2);
    assert_eq!(clicks[0]["referrer"], "https://first.example");
    assert_eq!(clicks[0]["location"], "Unknown");
    assert_eq!(clicks[1]["referrer"], "Unknown");
    assert!(clicks[0]["timestamp"].is_string());
}

#[tokio::test]
async fn test_stats_not_found() {
    let (router, _service) = create_test_app().await;

    let (status, body) = get_json(&router, "/shorturls/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Shortcode not found");
}

#[tokio::test]
async fn test_health_check() {
    let (router, _service) = create_test_app().await;

    let (status, body) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "OK");
}
