//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error answers with a JSON body `{ "error": <message>, "status": <category> }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::identity::IdentityError;
use crate::services::shipping::ShippingError;
use crate::shopify::ShopifyError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Identity provider call failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Shipping partner call failed.
    #[error("Shipping error: {0}")]
    Shipping(#[from] ShippingError),

    /// A collaborator was not configured at start-up.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(&'static str),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    status: &'static str,
}

impl AppError {
    /// HTTP status code and machine-readable category.
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Database(RepositoryError::Conflict(_)) => (StatusCode::CONFLICT, "conflict"),
            Self::Database(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            Self::Shopify(err) => match err {
                ShopifyError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                ShopifyError::UserError(_) => (StatusCode::BAD_REQUEST, "bad_request"),
                ShopifyError::InvalidCustomerToken => (StatusCode::UNAUTHORIZED, "unauthorized"),
                ShopifyError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
                ShopifyError::Http(_)
                | ShopifyError::Status { .. }
                | ShopifyError::GraphQL(_)
                | ShopifyError::Parse(_)
                | ShopifyError::EmptyResponse(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            },
            Self::Identity(err) if err.is_rejection() => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Identity(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            Self::Shipping(err) => match err {
                ShippingError::OrderNotFound(_) | ShippingError::InvoiceUnavailable(_) => {
                    (StatusCode::NOT_FOUND, "not_found")
                }
                _ => (StatusCode::BAD_GATEWAY, "upstream_error"),
            },
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::Conflict(_)) => "Record already exists".to_string(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Shopify(ShopifyError::NotFound(what)) => what.clone(),
            Self::Shopify(ShopifyError::UserError(msg)) => msg.clone(),
            Self::Shopify(ShopifyError::InvalidCustomerToken) => {
                "Session expired, please sign in again".to_string()
            }
            Self::Identity(err) if err.is_rejection() => "Invalid identity token".to_string(),
            Self::Shipping(
                err @ (ShippingError::OrderNotFound(_) | ShippingError::InvoiceUnavailable(_)),
            ) => err.to_string(),
            Self::Shopify(_) | Self::Identity(_) | Self::Shipping(_) => {
                "External service error".to_string()
            }
            Self::ServiceUnavailable(service) => format!("The {service} service is not available"),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Too many requests".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, category) = self.classify();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        // Don't expose internal error details to clients
        let body = ErrorBody {
            error: self.public_message(),
            status: category,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a verified identity.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn get_body(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::ServiceUnavailable("shipping");
        assert_eq!(err.to_string(), "Service unavailable: shipping");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            get_status(AppError::ServiceUnavailable("identity")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Identity(IdentityError::InvalidToken)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Shipping(ShippingError::OrderNotFound("1".to_string()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Shopify(ShopifyError::RateLimited(3))),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = get_body(AppError::Internal("connection refused on 10.0.0.3".to_string())).await;
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["status"], "internal_error");
    }

    #[tokio::test]
    async fn test_unavailable_body_names_service() {
        let body = get_body(AppError::ServiceUnavailable("shipping")).await;
        assert_eq!(body["error"], "The shipping service is not available");
        assert_eq!(body["status"], "service_unavailable");
    }
}
