//! Integration tests for Foodgram.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no database needed)
//! cargo test -p foodgram-integration-tests
//!
//! # API smoke tests against a running server with imported reference data
//! foodgram-cli migrate
//! foodgram-cli import ingredients data/ingredients.json
//! foodgram-cli import tags data/tags.json
//! cargo run -p foodgram-server &
//! cargo test -p foodgram-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `router` - Requests through the full middleware stack that never reach
//!   the database
//! - `recipe_writes` - Recipe validation and its JSON error responses
//! - `shopping_list` - Cart aggregation and the downloadable report
//! - `api_smoke` - End-to-end flows over HTTP (ignored by default)

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use foodgram_server::config::ServerConfig;
use foodgram_server::state::AppState;
use reqwest::Client;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

/// Public base URL used by in-process tests.
pub const TEST_BASE_URL: &str = "http://testserver";

/// Configuration for in-process tests. Nothing here is ever dialed.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://foodgram@127.0.0.1:1/foodgram_test"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: TEST_BASE_URL.to_owned(),
        media_root: std::env::temp_dir().join("foodgram-integration-media"),
        cors_origins: vec!["http://localhost:3000".to_owned()],
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The full application router over a pool that only connects on first use.
///
/// Requests that reach the database fail with 500; everything rejected
/// earlier (auth, body parsing, pagination, routing) behaves as in production.
///
/// # Panics
///
/// Panics if the configured database URL cannot be parsed.
#[must_use]
pub fn offline_app() -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy(secrecy::ExposeSecret::expose_secret(&config.database_url))
        .expect("Failed to build lazy pool");
    foodgram_server::app(AppState::new(config, pool))
}

/// A fully buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Body parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Send one request through `app` and buffer the response.
///
/// # Panics
///
/// Panics if the body cannot be read.
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = match app.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body")
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

/// Build a JSON request from a test client address.
///
/// # Panics
///
/// Panics if `uri` is not a valid request target.
#[must_use]
pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

/// Build a body-less request from a test client address.
///
/// # Panics
///
/// Panics if `uri` is not a valid request target.
#[must_use]
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .expect("Failed to build request")
}

// =============================================================================
// Live server helpers
// =============================================================================

/// Base URL of a running server (`FOODGRAM_TEST_URL`, default `http://localhost:8000`).
#[must_use]
pub fn live_base_url() -> String {
    std::env::var("FOODGRAM_TEST_URL").unwrap_or_else(|_| "http://localhost:8000".to_owned())
}

/// HTTP client for a running server, optionally authenticated with a token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub client: Client,
    pub base_url: String,
    pub token: Option<String>,
}

impl ApiClient {
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            client: Client::new(),
            base_url: live_base_url(),
            token: None,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Start a request with the `Authorization: Token ...` header when logged in.
    #[must_use]
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Token {token}")),
            None => builder,
        }
    }

    /// Register a fresh user and log in as them.
    ///
    /// # Panics
    ///
    /// Panics if registration or login fails.
    pub async fn register_and_login(prefix: &str) -> (Self, Value) {
        let anonymous = Self::anonymous();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let username = format!("{prefix}_{}", suffix.get(..12).unwrap_or(&suffix));
        let email = format!("{username}@example.com");
        let password = "correct-horse-battery";

        let resp = anonymous
            .request(reqwest::Method::POST, "/api/users/")
            .json(&serde_json::json!({
                "email": email,
                "username": username,
                "first_name": "Test",
                "last_name": "Cook",
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status().as_u16(), 201, "registration failed");
        let user: Value = resp.json().await.expect("Invalid registration body");

        let resp = anonymous
            .request(reqwest::Method::POST, "/api/auth/token/login/")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(resp.status().as_u16(), 200, "login failed");
        let body: Value = resp.json().await.expect("Invalid login body");
        let token = body["auth_token"]
            .as_str()
            .expect("auth_token missing")
            .to_owned();

        (
            Self {
                token: Some(token),
                ..anonymous
            },
            user,
        )
    }
}
