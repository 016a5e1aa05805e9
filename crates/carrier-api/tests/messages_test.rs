//! Integration tests for the message listing endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use carrier_api::{create_router, crypto::generate_hmac_hex, Config};
use carrier_core::{storage, Storage, TestClock};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

const SECRET: &str = "secret";

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    storage::run_migrations(&pool).await.expect("failed to run migrations");

    let storage = Storage::new(pool, Arc::new(TestClock::new()));
    let config = Config { webhook_secret: Some(SECRET.to_string()), ..Config::default() };

    create_router(storage, Arc::new(config))
}

/// Seeds the three-message scenario through the webhook endpoint itself.
async fn seed_messages(app: &Router) {
    let messages = [
        json!({"message_id": "m1", "from": "+123", "to": "+456", "ts": "2025-01-01T00:00:00Z", "text": "hello"}),
        json!({"message_id": "m2", "from": "+123", "to": "+456", "ts": "2025-01-02T00:00:00Z", "text": "world"}),
        json!({"message_id": "m3", "from": "+789", "to": "+456", "ts": "2025-01-03T00:00:00Z", "text": "test"}),
    ];

    for message in messages {
        let body = serde_json::to_vec(&message).unwrap();
        let signature = generate_hmac_hex(&body, SECRET).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("X-Signature", signature)
            .body(Body::from(body))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "seeding must succeed");
    }
}

async fn get_json(app: &Router, uri: &str) -> Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn ids(listing: &Value) -> Vec<&str> {
    listing["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|message| message["message_id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn empty_store_lists_empty_page() {
    let app = test_app().await;

    let listing = get_json(&app, "/messages").await;

    assert_eq!(listing["data"], json!([]));
    assert_eq!(listing["total"], 0);
    assert_eq!(listing["limit"], 50);
    assert_eq!(listing["offset"], 0);
}

#[tokio::test]
async fn listing_returns_all_messages_in_timestamp_order() {
    let app = test_app().await;
    seed_messages(&app).await;

    let listing = get_json(&app, "/messages").await;

    assert_eq!(listing["total"], 3);
    assert_eq!(ids(&listing), ["m1", "m2", "m3"]);

    let first = &listing["data"][0];
    assert_eq!(first["from"], "+123");
    assert_eq!(first["to"], "+456");
    assert_eq!(first["ts"], "2025-01-01T00:00:00Z");
    assert_eq!(first["text"], "hello");
    assert!(first["created_at"].is_string());
}

#[tokio::test]
async fn pagination_window_is_reported_back() {
    let app = test_app().await;
    seed_messages(&app).await;

    let listing = get_json(&app, "/messages?limit=2&offset=1").await;

    assert_eq!(listing["total"], 3);
    assert_eq!(listing["limit"], 2);
    assert_eq!(listing["offset"], 1);
    assert_eq!(ids(&listing), ["m2", "m3"]);
}

#[tokio::test]
async fn from_filter_matches_sender_exactly() {
    let app = test_app().await;
    seed_messages(&app).await;

    let listing = get_json(&app, "/messages?from=%2B123").await;

    assert_eq!(listing["total"], 2);
    assert_eq!(ids(&listing), ["m1", "m2"]);
}

#[tokio::test]
async fn since_filter_is_inclusive() {
    let app = test_app().await;
    seed_messages(&app).await;

    let listing = get_json(&app, "/messages?since=2025-01-02T00:00:00Z").await;

    assert_eq!(listing["total"], 2);
    assert_eq!(ids(&listing), ["m2", "m3"]);
}

#[tokio::test]
async fn q_filter_searches_text() {
    let app = test_app().await;
    seed_messages(&app).await;

    let listing = get_json(&app, "/messages?q=hello").await;

    assert_eq!(listing["total"], 1);
    assert_eq!(ids(&listing), ["m1"]);
}

#[tokio::test]
async fn filters_combine_conjunctively() {
    let app = test_app().await;
    seed_messages(&app).await;

    let listing = get_json(&app, "/messages?from=%2B123&since=2025-01-02T00:00:00Z").await;

    assert_eq!(listing["total"], 1);
    assert_eq!(ids(&listing), ["m2"]);
}

#[tokio::test]
async fn out_of_range_limit_degrades_to_default() {
    let app = test_app().await;
    seed_messages(&app).await;

    for uri in ["/messages?limit=150", "/messages?limit=0", "/messages?limit=-1"] {
        let listing = get_json(&app, uri).await;
        assert_eq!(listing["limit"], 50, "{uri} should clamp to the default limit");
        assert_eq!(listing["total"], 3);
    }
}

#[tokio::test]
async fn negative_offset_degrades_to_zero() {
    let app = test_app().await;
    seed_messages(&app).await;

    let listing = get_json(&app, "/messages?offset=-5").await;

    assert_eq!(listing["offset"], 0);
    assert_eq!(ids(&listing), ["m1", "m2", "m3"]);
}

#[tokio::test]
async fn offset_past_the_end_yields_empty_page() {
    let app = test_app().await;
    seed_messages(&app).await;

    let listing = get_json(&app, "/messages?offset=50").await;

    assert_eq!(listing["total"], 3);
    assert_eq!(listing["data"], json!([]));
}
