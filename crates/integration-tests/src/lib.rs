//! Integration tests for Meadowlark.
//!
//! Drives the full storefront router in-process with
//! `tower::ServiceExt::oneshot`. Shopify, the identity provider and the
//! shipping partner are `wiremock` servers; sessions live in a
//! `tower_sessions::MemoryStore`. The database pool connects lazily and the
//! tests never touch it.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p meadowlark-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use meadowlark_storefront::config::{
    Environment, IdentityConfig, ShippingConfig, ShopifyStorefrontConfig, StorefrontConfig,
};
use meadowlark_storefront::routes;
use meadowlark_storefront::state::AppState;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client address sent on every request; the rate limiter keys on it.
pub const CLIENT_IP: &str = "203.0.113.7";

/// Mock collaborators plus the configuration pointing at them.
pub struct Harness {
    pub shopify: MockServer,
    pub identity: MockServer,
    pub shipping: MockServer,
    config: StorefrontConfig,
}

impl Harness {
    /// Start all mock servers with every collaborator configured.
    pub async fn start() -> Self {
        let shopify = MockServer::start().await;
        let identity = MockServer::start().await;
        let shipping = MockServer::start().await;

        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://meadowlark@127.0.0.1:1/meadowlark_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            environment: Environment::Development,
            shopify: ShopifyStorefrontConfig {
                store: "meadowlark-test.myshopify.com".to_string(),
                api_version: "2026-01".to_string(),
                endpoint: format!("{}/api/2026-01/graphql.json", shopify.uri()),
                storefront_token: SecretString::from("test-storefront-token"),
            },
            identity: IdentityConfig {
                base_url: identity.uri(),
                api_key: Some(SecretString::from("test-identity-key")),
                resolve_wait: Duration::from_millis(500),
            },
            shipping: ShippingConfig {
                base_url: shipping.uri(),
                email: Some("ops@meadowlark.test".to_string()),
                password: Some(SecretString::from("shipping-password")),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        Self {
            shopify,
            identity,
            shipping,
            config,
        }
    }

    /// Serve as production (secure cookies).
    #[must_use]
    pub fn production(mut self) -> Self {
        self.config.environment = Environment::Production;
        self
    }

    /// Leave the identity provider unconfigured.
    #[must_use]
    pub fn without_identity(mut self) -> Self {
        self.config.identity.api_key = None;
        self
    }

    /// Leave the shipping partner unconfigured.
    #[must_use]
    pub fn without_shipping(mut self) -> Self {
        self.config.shipping.email = None;
        self.config.shipping.password = None;
        self
    }

    /// How long account pages wait for an identity check.
    #[must_use]
    pub fn resolve_wait(mut self, wait: Duration) -> Self {
        self.config.identity.resolve_wait = wait;
        self
    }

    /// Build the application. Clones share one session store.
    pub fn app(&self) -> Router {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(250))
            .connect_lazy("postgres://meadowlark@127.0.0.1:1/meadowlark_test")
            .unwrap();
        let state = AppState::new(self.config.clone(), pool).unwrap();
        routes::app(state, MemoryStore::default())
    }

    /// Answer identity lookups for `token` with a user.
    pub async fn mount_identity_user(&self, token: &str, uid: &str, phone: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/v1/accounts:lookup"))
            .and(body_partial_json(serde_json::json!({ "idToken": token })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "users": [{ "localId": uid, "phoneNumber": phone }]
                    }))
                    .set_delay(delay),
            )
            .mount(&self.identity)
            .await;
    }

    /// Reject identity lookups for `token`.
    pub async fn mount_identity_rejection(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/accounts:lookup"))
            .and(body_partial_json(serde_json::json!({ "idToken": token })))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "code": 400, "message": "INVALID_ID_TOKEN" }
            })))
            .mount(&self.identity)
            .await;
    }

    /// Answer one Storefront API operation with `data`.
    pub async fn mount_shopify(&self, operation: &str, data: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/api/2026-01/graphql.json"))
            .and(body_partial_json(serde_json::json!({ "operationName": operation })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": data
            })))
            .mount(&self.shopify)
            .await;
    }
}

/// A buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// Body as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Full `Set-Cookie` header for `name`, if one was sent.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
            .map(str::to_string)
    }

    /// `name=value` pair from a `Set-Cookie` header, ready for a `Cookie` header.
    pub fn cookie_pair(&self, name: &str) -> Option<String> {
        self.set_cookie(name)
            .and_then(|c| c.split(';').next().map(str::to_string))
    }

    /// `Location` header.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Request builder with the client address header already set.
pub fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
}

/// JSON request.
pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    request(method, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send one request through a clone of `app`.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        headers,
        body,
    }
}
