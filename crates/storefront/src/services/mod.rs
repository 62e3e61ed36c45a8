//! Collaborator services for the storefront.
//!
//! # Services
//!
//! - `identity` - Phone identity provider (ID token verification)
//! - `session` - Per-credential identity signal shared by concurrent requests
//! - `shipping` - Shipping partner API (order invoices)
//!
//! Identity and shipping need credentials that a deployment may not have.
//! Their availability is decided once at start-up and wrapped in a
//! [`ServiceStatus`]; handlers call [`ServiceStatus::require`] before use.

pub mod identity;
pub mod session;
pub mod shipping;

use crate::error::AppError;

/// Start-up availability of an optional collaborator.
#[derive(Debug, Clone)]
pub enum ServiceStatus<T> {
    /// Configured and ready.
    Available(T),
    /// Not configured; the reason is logged at start-up.
    Unavailable(String),
}

impl<T> ServiceStatus<T> {
    /// Build from an optional service, logging why it is missing.
    pub fn from_option(service: &'static str, value: Option<T>, reason: &str) -> Self {
        value.map_or_else(
            || {
                tracing::warn!(service, reason, "Service unavailable");
                Self::Unavailable(reason.to_string())
            },
            Self::Available,
        )
    }

    /// Whether the service can be used.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Borrow the service or fail with `503 Service Unavailable`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ServiceUnavailable` naming `service` when the
    /// service was not configured.
    pub fn require(&self, service: &'static str) -> Result<&T, AppError> {
        match self {
            Self::Available(value) => Ok(value),
            Self::Unavailable(reason) => {
                tracing::debug!(service, reason = %reason, "Rejected call to unavailable service");
                Err(AppError::ServiceUnavailable(service))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;

    #[test]
    fn test_require_available() {
        let status = ServiceStatus::Available(7);
        assert!(status.is_available());
        assert_eq!(status.require("numbers").ok(), Some(&7));
    }

    #[test]
    fn test_require_unavailable_is_503() {
        let status: ServiceStatus<u8> =
            ServiceStatus::from_option("shipping", None, "SHIPPING_EMAIL not set");
        assert!(!status.is_available());

        let err = status.require("shipping").err();
        assert!(matches!(err, Some(AppError::ServiceUnavailable("shipping"))));
        assert_eq!(
            err.map(|e| e.into_response().status()),
            Some(StatusCode::SERVICE_UNAVAILABLE)
        );
    }
}
