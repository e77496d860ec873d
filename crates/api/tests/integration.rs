//! Integration tests for API routes.
//!
//! Uses `tower::ServiceExt` to test Axum routes without a real HTTP server, and
//! a `wiremock` server standing in for GCM.
//!
//! ```bash
//! cargo test -p gcm-api --test integration
//! ```

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gcm_api::routes::create_router;
use gcm_api::state::AppState;
use gcm_common::config::AppConfig;

// ============================================================
// Helpers
// ============================================================

/// Create a test AppConfig pointing at the mock gateway with fast retries.
fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        gcm_url: format!("{}/gcm/send", server.uri()),
        registration_ids_limit: 3,
        max_seconds_to_live: 3600,
        backoff_retries: 2,
        min_backoff_delay_ms: 1,
        max_backoff_delay_ms: 10,
        gcm_http_timeout_secs: 5,
        ..AppConfig::default()
    }
}

fn build_app(config: &AppConfig) -> Router {
    let state = AppState::from_config(config).expect("state should build");
    create_router(state)
}

async fn post_send(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/send")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ============================================================
// Routes
// ============================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let app = build_app(&test_config(&server));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "gcm-relay-api");
}

#[tokio::test]
async fn test_send_returns_ordered_summary() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gcm/send"))
        .and(header("Authorization", "key=AIza-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "multicast_id": 216,
            "success": 2,
            "failure": 1,
            "canonical_ids": 1,
            "results": [
                { "message_id": "1:0408" },
                { "error": "InvalidRegistration" },
                { "message_id": "1:2342", "registration_id": "32" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(&test_config(&server));
    let (status, body) = post_send(
        app,
        json!({
            "api_key": "AIza-test",
            "notification": {
                "registration_ids": ["4", "8", "15"],
                "time_to_live": 600,
                "data": { "score": "5x1" }
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "multicast_id": 216,
            "success": 2,
            "failure": 1,
            "canonical_ids": 1,
            "results": [
                { "message_id": "1:0408" },
                { "error": "InvalidRegistration" },
                { "message_id": "1:2342", "registration_id": "32" }
            ]
        })
    );
}

#[tokio::test]
async fn test_validation_errors_never_reach_gateway() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    let cases = [
        (
            json!({ "notification": { "registration_ids": ["a"] } }),
            "Missing mandatory field 'api_key'",
        ),
        (
            json!({ "api_key": "k" }),
            "Missing mandatory field 'notification'",
        ),
        (
            json!({ "api_key": "k", "notification": { "registration_ids": ["a"], "time_to_live": 3601 } }),
            "Max value of 'time_to_live' exceeded: 3601 > 3600",
        ),
        (
            json!({ "api_key": "k", "notification": { "registration_ids": [] } }),
            "Missing mandatory non-empty field 'registration_ids'",
        ),
        (
            json!({ "api_key": "k", "notification": { "registration_ids": ["a", "b", "c", "d"] } }),
            "Max size of 'registration_ids' exceeded: 4 > 3",
        ),
    ];

    for (body, expected) in cases {
        let (status, json) = post_send(build_app(&config), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], expected);
    }

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty(), "gateway must not be called on validation failure");
}

#[tokio::test]
async fn test_unavailable_gateway_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let app = build_app(&test_config(&server));
    let (status, body) = post_send(
        app,
        json!({
            "api_key": "AIza-test",
            "notification": { "registration_ids": ["a", "b"] }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({ "error": "GCM is unavailable" }));
}

#[tokio::test]
async fn test_malformed_json_body_is_rejected() {
    let server = MockServer::start().await;
    let app = build_app(&test_config(&server));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/send")
                .header("Content-Type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
