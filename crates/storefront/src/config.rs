//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_TOKEN` - Storefront API private access token
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_ENV` - `production` or `development` (default: production)
//! - `SHOPIFY_API_VERSION` - API version (default: 2026-01)
//! - `SHOPIFY_STOREFRONT_ENDPOINT` - Full GraphQL endpoint override
//! - `IDENTITY_API_KEY` - Phone identity provider API key (identity features
//!   are unavailable without it)
//! - `IDENTITY_BASE_URL` - Identity provider base URL
//! - `IDENTITY_RESOLVE_WAIT_MS` - How long account pages wait for an identity
//!   check before showing the loading placeholder (default: 800)
//! - `SHIPPING_EMAIL` / `SHIPPING_PASSWORD` - Shipping partner API login
//!   (invoice lookup is unavailable without them)
//! - `SHIPPING_BASE_URL` - Shipping partner API base URL
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_SHIPPING_BASE_URL: &str = "https://apiv2.shiprocket.in";
const DEFAULT_RESOLVE_WAIT_MS: u64 = 800;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Deployment environment.
///
/// Decides whether auth cookies carry the `Secure` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development over plain HTTP.
    Development,
    /// Anything served over HTTPS.
    #[default]
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "production" | "prod" | "staging" => Ok(Self::Production),
            other => Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_ENV".to_string(),
                format!("unknown environment '{other}'"),
            )),
        }
    }

    /// Whether cookies should be marked `Secure`.
    #[must_use]
    pub const fn secure_cookies(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Phone identity provider configuration
    pub identity: IdentityConfig,
    /// Shipping partner configuration
    pub shipping: ShippingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// GraphQL endpoint URL
    pub endpoint: String,
    /// Storefront API private access token (server-side only)
    pub storefront_token: SecretString,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("endpoint", &self.endpoint)
            .field("storefront_token", &"[REDACTED]")
            .finish()
    }
}

/// Phone identity provider configuration.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Provider base URL
    pub base_url: String,
    /// API key; `None` leaves identity features unavailable
    pub api_key: Option<SecretString>,
    /// Upper bound on how long a page waits for an identity check
    pub resolve_wait: Duration,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("resolve_wait", &self.resolve_wait)
            .finish()
    }
}

/// Shipping partner configuration.
#[derive(Clone)]
pub struct ShippingConfig {
    /// Partner API base URL
    pub base_url: String,
    /// API user email
    pub email: Option<String>,
    /// API user password
    pub password: Option<SecretString>,
}

impl std::fmt::Debug for ShippingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippingConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    /// Missing identity or shipping credentials are not errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let environment = Environment::parse(&get_env_or_default("STOREFRONT_ENV", "production"))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            environment,
            shopify: ShopifyStorefrontConfig::from_env()?,
            identity: IdentityConfig::from_env()?,
            shipping: ShippingConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyStorefrontConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let store = get_required_env("SHOPIFY_STORE")?;
        let api_version = get_env_or_default("SHOPIFY_API_VERSION", "2026-01");
        let endpoint = get_optional_env("SHOPIFY_STOREFRONT_ENDPOINT")
            .unwrap_or_else(|| Self::endpoint_for(&store, &api_version));

        Ok(Self {
            store,
            api_version,
            endpoint,
            storefront_token: get_validated_secret("SHOPIFY_STOREFRONT_TOKEN")?,
        })
    }

    /// The Storefront API GraphQL endpoint for a store domain.
    #[must_use]
    pub fn endpoint_for(store: &str, api_version: &str) -> String {
        format!("https://{store}/api/{api_version}/graphql.json")
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = match get_optional_env("IDENTITY_API_KEY") {
            Some(value) => {
                validate_secret_strength(&value, "IDENTITY_API_KEY")?;
                Some(SecretString::from(value))
            }
            None => None,
        };
        let wait_ms: u64 = parse_env(
            "IDENTITY_RESOLVE_WAIT_MS",
            &DEFAULT_RESOLVE_WAIT_MS.to_string(),
        )?;

        Ok(Self {
            base_url: get_env_or_default("IDENTITY_BASE_URL", DEFAULT_IDENTITY_BASE_URL),
            api_key,
            resolve_wait: Duration::from_millis(wait_ms),
        })
    }
}

impl ShippingConfig {
    fn from_env() -> Self {
        Self {
            base_url: get_env_or_default("SHIPPING_BASE_URL", DEFAULT_SHIPPING_BASE_URL),
            email: get_optional_env("SHIPPING_EMAIL"),
            password: get_optional_env("SHIPPING_PASSWORD").map(SecretString::from),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable; empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
