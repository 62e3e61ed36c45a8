//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Rate limiting on auth and form routes (governor)
//!
//! Credentials travel in cookies and headers and are read by extractors.

pub mod customer_token;
pub mod identity;
pub mod rate_limit;
pub mod session;

pub use customer_token::{CustomerToken, clear_customer_token, set_customer_token};
pub use identity::{BearerIdentity, IdentityCredential};
pub use rate_limit::{auth_rate_limiter, form_rate_limiter};
pub use session::{create_session_layer, postgres_store};
