//! Application state shared across handlers.

use std::sync::Arc;

use meadowlark_core::AccountGate;
use sqlx::PgPool;
use url::Url;

use crate::config::StorefrontConfig;
use crate::services::ServiceStatus;
use crate::services::identity::IdentityClient;
use crate::services::session::SessionResolver;
use crate::services::shipping::ShippingClient;
use crate::shopify::StorefrontClient;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid base_url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("base_url must be http or https, got {0}")]
    UnsupportedScheme(String),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    base_url: Url,
    pool: PgPool,
    storefront: StorefrontClient,
    sessions: ServiceStatus<SessionResolver>,
    shipping: ServiceStatus<ShippingClient>,
    gate: AccountGate,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Identity and shipping collaborators are marked unavailable when their
    /// credentials are missing; that is logged here, once.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is invalid.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let base_url = Url::parse(&config.base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(StateError::UnsupportedScheme(base_url.scheme().to_string()));
        }

        let storefront = StorefrontClient::new(&config.shopify);

        let sessions = ServiceStatus::from_option(
            "identity",
            config.identity.api_key.clone().map(|key| {
                SessionResolver::new(
                    IdentityClient::new(&config.identity.base_url, key),
                    config.identity.resolve_wait,
                )
            }),
            "IDENTITY_API_KEY not set",
        );

        let shipping = ServiceStatus::from_option(
            "shipping",
            config
                .shipping
                .email
                .clone()
                .zip(config.shipping.password.clone())
                .map(|(email, password)| {
                    ShippingClient::new(&config.shipping.base_url, email, password)
                }),
            "SHIPPING_EMAIL or SHIPPING_PASSWORD not set",
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                base_url,
                pool,
                storefront,
                sessions,
                shipping,
                gate: AccountGate::default(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Parsed public base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Whether cookies set by the storefront carry `Secure`.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.inner.config.environment.secure_cookies()
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Identity resolution, if an identity provider is configured.
    #[must_use]
    pub fn sessions(&self) -> &ServiceStatus<SessionResolver> {
        &self.inner.sessions
    }

    /// Shipping partner client, if configured.
    #[must_use]
    pub fn shipping(&self) -> &ServiceStatus<ShippingClient> {
        &self.inner.shipping
    }

    /// Account route gate.
    #[must_use]
    pub fn gate(&self) -> &AccountGate {
        &self.inner.gate
    }
}
