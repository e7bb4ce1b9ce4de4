//! In-process tests of the assembled router.
//!
//! Every request here is settled before any query runs (routing, auth
//! extraction, body parsing, pagination, rate limiting), so no database is
//! needed.

use axum::http::StatusCode;
use foodgram_integration_tests::{empty_request, json_request, offline_app, send};
use serde_json::json;

// =============================================================================
// Health & Middleware
// =============================================================================

#[tokio::test]
async fn test_health() {
    let resp = send(offline_app(), empty_request("GET", "/health")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, b"ok");
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let resp = send(offline_app(), empty_request("GET", "/health")).await;

    assert_eq!(resp.header("x-frame-options"), Some("DENY"));
    assert_eq!(resp.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(resp.header("cache-control"), Some("no-store, max-age=0"));

    let id = resp.header("x-request-id").expect("request id missing");
    assert!(uuid::Uuid::parse_str(id).is_ok(), "{id}");
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let mut request = empty_request("GET", "/health");
    request
        .headers_mut()
        .insert("x-request-id", "edge-42".parse().expect("header value"));

    let resp = send(offline_app(), request).await;
    assert_eq!(resp.header("x-request-id"), Some("edge-42"));
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let mut request = empty_request("OPTIONS", "/api/recipes/");
    let headers = request.headers_mut();
    headers.insert("origin", "http://localhost:3000".parse().expect("origin"));
    headers.insert(
        "access-control-request-method",
        "POST".parse().expect("method"),
    );

    let resp = send(offline_app(), request).await;
    assert_eq!(
        resp.header("access-control-allow-origin"),
        Some("http://localhost:3000")
    );
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_unknown_route() {
    let resp = send(offline_app(), empty_request("GET", "/api/nothing-here/")).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_recipe_replace_is_not_allowed() {
    let resp = send(
        offline_app(),
        json_request("PUT", "/api/recipes/1/", &json!({ "name": "Soup" })),
    )
    .await;

    assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.json(), json!({ "detail": "Method not allowed" }));
}

#[tokio::test]
async fn test_malformed_short_link() {
    for path in ["/s/zzzzzz", "/s/abc/", "/s/abcdef12"] {
        let resp = send(offline_app(), empty_request("GET", path)).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(resp.json(), json!({ "detail": "short link not found" }));
    }
}

// =============================================================================
// Auth Extraction
// =============================================================================

#[tokio::test]
async fn test_writes_require_a_token() {
    let cases = [
        ("POST", "/api/recipes/"),
        ("PATCH", "/api/recipes/1/"),
        ("DELETE", "/api/recipes/1/"),
        ("POST", "/api/recipes/1/favorite/"),
        ("DELETE", "/api/recipes/1/shopping_cart/"),
        ("GET", "/api/recipes/download_shopping_cart/"),
        ("GET", "/api/users/me/"),
        ("GET", "/api/users/subscriptions/"),
        ("POST", "/api/users/2/subscribe/"),
        ("POST", "/api/auth/token/logout/"),
    ];

    for (method, path) in cases {
        let resp = send(offline_app(), json_request(method, path, &json!({}))).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "{method} {path}");
        assert_eq!(
            resp.json(),
            json!({ "detail": "Authentication credentials were not provided" }),
            "{method} {path}"
        );
    }
}

// =============================================================================
// Request Bodies & Pagination
// =============================================================================

#[tokio::test]
async fn test_malformed_json_body() {
    let mut request = json_request("POST", "/api/users/", &json!({}));
    *request.body_mut() = "{\"email\": ".into();

    let resp = send(offline_app(), request).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["detail"].is_string());
}

#[tokio::test]
async fn test_registration_field_errors() {
    let resp = send(
        offline_app(),
        json_request(
            "POST",
            "/api/users/",
            &json!({
                "email": "not-an-email",
                "username": "me",
                "first_name": "Ann",
                "last_name": "Lee",
                "password": "short",
            }),
        ),
    )
    .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let body = resp.json();
    let fields: Vec<&String> = body.as_object().expect("field map").keys().collect();
    assert_eq!(fields, ["email", "password", "username"]);
}

#[tokio::test]
async fn test_invalid_page_is_not_found() {
    for path in [
        "/api/users/?page=0",
        "/api/recipes/?page=abc",
        "/api/recipes/?page=9223372036854775807&limit=50",
    ] {
        let resp = send(offline_app(), empty_request("GET", path)).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(resp.json(), json!({ "detail": "Invalid page" }));
    }
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = offline_app();
    let attempt = || {
        let mut request = json_request("POST", "/api/auth/token/login/", &json!({}));
        // rejected by the body parser, so only the limiter is exercised
        *request.body_mut() = "not json".into();
        request
    };

    for _ in 0..5 {
        let resp = send(app.clone(), attempt()).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    }
    let resp = send(app.clone(), attempt()).await;
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
}
