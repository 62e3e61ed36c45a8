//! Customer token cookie flow.

#![allow(clippy::unwrap_used)]

use axum::{body::Body, http::StatusCode};
use meadowlark_integration_tests::{Harness, json_request, request, send};
use serde_json::json;

const COOKIE: &str = "customerAccessToken";

async fn mount_token(harness: &Harness) {
    harness
        .mount_shopify(
            "CustomerAccessTokenCreate",
            json!({
                "customerAccessTokenCreate": {
                    "customerAccessToken": {
                        "accessToken": "tok-abc123",
                        "expiresAt": "2026-12-01T00:00:00Z"
                    },
                    "customerUserErrors": []
                }
            }),
        )
        .await;
}

fn login_body() -> serde_json::Value {
    json!({ "email": "ada@example.com", "password": "correct horse" })
}

#[tokio::test]
async fn test_login_sets_thirty_day_cookie() {
    let harness = Harness::start().await;
    mount_token(&harness).await;
    let app = harness.app();

    let response = send(&app, json_request("POST", "/api/auth/login", &login_body())).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["authenticated"], true);

    let cookie = response.set_cookie(COOKIE).unwrap();
    assert!(cookie.starts_with("customerAccessToken=tok-abc123"));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_production_cookie_is_secure() {
    let harness = Harness::start().await.production();
    mount_token(&harness).await;
    let app = harness.app();

    let response = send(&app, json_request("POST", "/api/auth/login", &login_body())).await;
    assert!(response.set_cookie(COOKIE).unwrap().contains("Secure"));
}

#[tokio::test]
async fn test_rejected_login_is_401_without_cookie() {
    let harness = Harness::start().await;
    harness
        .mount_shopify(
            "CustomerAccessTokenCreate",
            json!({
                "customerAccessTokenCreate": {
                    "customerAccessToken": null,
                    "customerUserErrors": [
                        { "code": "UNIDENTIFIED_CUSTOMER", "message": "Unidentified customer" }
                    ]
                }
            }),
        )
        .await;
    let app = harness.app();

    let response = send(&app, json_request("POST", "/api/auth/login", &login_body())).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.set_cookie(COOKIE).is_none());
}

#[tokio::test]
async fn test_invalid_email_is_400() {
    let harness = Harness::start().await;
    let app = harness.app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            &json!({ "email": "nope", "password": "whatever" }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["status"], "bad_request");
}

#[tokio::test]
async fn test_logout_expires_cookie() {
    let harness = Harness::start().await;
    harness
        .mount_shopify(
            "CustomerAccessTokenDelete",
            json!({ "customerAccessTokenDelete": { "deletedAccessToken": "tok-abc123" } }),
        )
        .await;
    let app = harness.app();

    let response = send(
        &app,
        request("POST", "/api/auth/logout")
            .header("cookie", "customerAccessToken=tok-abc123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["authenticated"], false);

    let cookie = response.set_cookie(COOKIE).unwrap();
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(harness.shopify.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_current_customer() {
    let harness = Harness::start().await;
    harness
        .mount_shopify(
            "GetCustomer",
            json!({
                "customer": {
                    "id": "gid://shopify/Customer/1",
                    "email": "ada@example.com",
                    "firstName": "Ada",
                    "lastName": null,
                    "phone": null
                }
            }),
        )
        .await;
    let app = harness.app();

    let anonymous = send(&app, request("GET", "/api/auth/customer").body(Body::empty()).unwrap()).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        request("GET", "/api/auth/customer")
            .header("cookie", "customerAccessToken=tok-abc123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["customer"]["firstName"], "Ada");
}

#[tokio::test]
async fn test_stale_token_is_cleared() {
    let harness = Harness::start().await;
    harness
        .mount_shopify("GetCustomer", json!({ "customer": null }))
        .await;
    let app = harness.app();

    let response = send(
        &app,
        request("GET", "/api/auth/customer")
            .header("cookie", "customerAccessToken=stale")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.set_cookie(COOKIE).unwrap().contains("Max-Age=0"));
}
