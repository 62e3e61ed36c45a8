//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Cart (session-backed)
//! GET    /cart                 - Cart as JSON
//! GET    /cart/drawer          - Cart drawer fragment
//! GET    /cart/count           - Item count
//! POST   /cart/items           - Add one unit of a variant
//! PATCH  /cart/items/{id}      - Set quantity (0 removes)
//! DELETE /cart/items/{id}      - Remove line
//! POST   /cart/clear           - Empty the cart
//! POST   /cart/toggle          - Flip drawer
//! POST   /cart/open            - Open drawer
//! POST   /cart/close           - Close drawer
//!
//! # Catalogue
//! GET  /api/products                    - Product page (?first&after)
//! GET  /api/products/{handle}           - Product detail
//! GET  /api/collections                 - Collection page (?first&after)
//! GET  /api/collections/{handle}        - Collection with products
//!
//! # Customer auth (rate limited)
//! POST /api/auth/login         - Email/password login, sets token cookie
//! POST /api/auth/register      - Create account, sets token cookie
//! POST /api/auth/logout        - Revoke token, expires cookie
//! GET  /api/auth/customer      - Current customer
//!
//! # Identity API (bearer)
//! POST /api/users              - Upsert profile
//! GET  /api/users/me           - Identity and profile
//! GET  /api/invoices/{order}   - Shipping invoice link
//!
//! # Forms (rate limited)
//! POST /api/contact            - Contact submission
//! POST /api/newsletter         - Newsletter sign-up
//!
//! # Account
//! GET  /account, /account/{*path}  - Gate-driven account pages
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod cart;
pub mod collections;
pub mod contact;
pub mod newsletter;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::middleware::{auth_rate_limiter, create_session_layer, form_rate_limiter};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/drawer", get(cart::drawer))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/toggle", post(cart::toggle))
        .route("/open", post(cart::open))
        .route("/close", post(cart::close))
}

/// Create the customer auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(credentials)
        .route("/logout", post(auth::logout))
        .route("/customer", get(auth::customer))
}

/// Create the form submission routes router.
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact::submit))
        .route("/newsletter", post(newsletter::subscribe))
        .layer(form_rate_limiter())
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{handle}", get(products::show))
        .route("/collections", get(collections::index))
        .route("/collections/{handle}", get(collections::show))
        .route("/users", post(api::users::upsert))
        .route("/users/me", get(api::users::me))
        .route("/invoices/{order}", get(api::invoices::show))
        .nest("/auth", auth_routes())
        .merge(form_routes())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/cart", cart_routes())
        .nest("/api", api_routes())
        .route("/account", get(account::page))
        .route("/account/{*path}", get(account::page))
}

/// Build the full application: routes, sessions over `store`, tracing and
/// Sentry layers.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.secure_cookies());

    routes()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
