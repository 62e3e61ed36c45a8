//! Customer authentication handlers.
//!
//! Email/password sign-in against the Shopify Storefront API. A successful
//! login or registration stores the customer access token in an HTTP-only
//! cookie for 30 days; logout revokes the token and expires the cookie.

use axum::{
    Json,
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Response},
};
use meadowlark_core::Email;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result, clear_sentry_user};
use crate::middleware::{CustomerToken, clear_customer_token, set_customer_token};
use crate::shopify::ShopifyError;
use crate::shopify::types::{Customer, CustomerCreateInput};
use crate::state::AppState;

/// Shortest password Shopify accepts.
const MIN_PASSWORD_LENGTH: usize = 5;

// =============================================================================
// Request Types
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: SecretString,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub accepts_marketing: bool,
}

/// Authentication result.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw.trim()).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn check_password(password: &SecretString) -> Result<()> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Respond with `body` and a cookie carrying `token`.
fn signed_in(state: &AppState, token: &str, customer: Option<Customer>) -> Response {
    (
        AppendHeaders([(SET_COOKIE, set_customer_token(token, state.secure_cookies()))]),
        Json(AuthResponse {
            authenticated: true,
            customer,
        }),
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Sign in with email and password.
#[instrument(skip_all, fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response> {
    let email = parse_email(&request.email)?;

    let token = state
        .storefront()
        .create_customer_access_token(email.as_str(), request.password.expose_secret())
        .await
        .map_err(|e| match e {
            ShopifyError::UserError(_) | ShopifyError::InvalidCustomerToken => {
                AppError::Unauthorized("Invalid email or password".to_string())
            }
            other => AppError::Shopify(other),
        })?;

    info!(email = %email, "Customer signed in");
    Ok(signed_in(&state, &token.access_token, None))
}

/// Create an account and sign in.
#[instrument(skip_all, fields(email = %request.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response> {
    let email = parse_email(&request.email)?;
    check_password(&request.password)?;

    let customer = state
        .storefront()
        .create_customer(CustomerCreateInput {
            email: email.as_str().to_string(),
            password: request.password.expose_secret().to_string(),
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            accepts_marketing: request.accepts_marketing,
        })
        .await?;

    let token = state
        .storefront()
        .create_customer_access_token(email.as_str(), request.password.expose_secret())
        .await?;

    info!(email = %email, "Customer registered");
    Ok(signed_in(&state, &token.access_token, Some(customer)))
}

/// Revoke the token (best effort) and expire the cookie.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, CustomerToken(token): CustomerToken) -> Response {
    if let Some(token) = token {
        if let Err(e) = state.storefront().delete_customer_access_token(&token).await {
            warn!(error = %e, "Failed to revoke customer access token");
        }
    }
    clear_sentry_user();

    (
        AppendHeaders([(SET_COOKIE, clear_customer_token(state.secure_cookies()))]),
        Json(AuthResponse {
            authenticated: false,
            customer: None,
        }),
    )
        .into_response()
}

/// The signed-in customer.
///
/// A token Shopify no longer accepts is answered with 401 and an expired
/// cookie so the browser stops sending it.
#[instrument(skip_all)]
pub async fn customer(
    State(state): State<AppState>,
    CustomerToken(token): CustomerToken,
) -> Response {
    let Some(token) = token else {
        return AppError::Unauthorized("Not signed in".to_string()).into_response();
    };

    match state.storefront().get_customer(&token).await {
        Ok(customer) => Json(AuthResponse {
            authenticated: true,
            customer: Some(customer),
        })
        .into_response(),
        Err(ShopifyError::InvalidCustomerToken) => (
            AppendHeaders([(SET_COOKIE, clear_customer_token(state.secure_cookies()))]),
            AppError::Shopify(ShopifyError::InvalidCustomerToken),
        )
            .into_response(),
        Err(e) => AppError::Shopify(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_password_length() {
        assert!(check_password(&SecretString::from("abcd")).is_err());
        assert!(check_password(&SecretString::from("abcde")).is_ok());
    }

    #[test]
    fn test_parse_email_trims() {
        assert!(parse_email("  ada@example.com ").is_ok());
        assert!(matches!(parse_email("not-an-email"), Err(AppError::BadRequest(_))));
    }
}
