//! Account area pages.
//!
//! Every request under `/account` is answered from the [`AccountGate`]'s
//! decision for the request path and the visitor's identity state:
//! public pages render, private pages either show a self-refreshing
//! placeholder while the identity check is in flight, redirect to the login
//! page, or render with a breadcrumb trail.
//!
//! [`AccountGate`]: meadowlark_core::AccountGate

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{OriginalUri, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use meadowlark_core::{AuthState, Breadcrumb, GateDecision, PhoneNumber, gate::RouteClass};
use tracing::{debug, instrument};

use crate::error::{AppError, Result, set_sentry_user};
use crate::middleware::IdentityCredential;
use crate::services::ServiceStatus;
use crate::services::identity::Identity;
use crate::state::AppState;

/// Seconds before the loading placeholder reloads itself.
const LOADING_REFRESH_SECONDS: u32 = 1;

// =============================================================================
// Templates
// =============================================================================

/// Phone sign-in page.
#[derive(Template, WebTemplate)]
#[template(path = "account/login.html")]
pub struct LoginTemplate {
    pub signed_in_as: Option<String>,
}

/// Account registration page.
#[derive(Template, WebTemplate)]
#[template(path = "account/register.html")]
pub struct RegisterTemplate {
    pub signed_in_as: Option<String>,
}

/// Placeholder shown while the identity check is still running.
#[derive(Template, WebTemplate)]
#[template(path = "account/loading.html")]
pub struct LoadingTemplate {
    pub refresh_seconds: u32,
}

/// A private account page.
#[derive(Template, WebTemplate)]
#[template(path = "account/page.html")]
pub struct AccountPageTemplate {
    pub title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub signed_in_as: String,
}

fn display_name(identity: &Identity) -> String {
    identity
        .phone
        .as_ref()
        .map_or_else(|| identity.uid.clone(), |phone| PhoneNumber::as_str(phone).to_string())
}

// =============================================================================
// Handlers
// =============================================================================

/// Resolve the visitor's identity state for `path`.
///
/// A credential with no identity provider configured is a 503 on private
/// pages; public pages still render.
async fn auth_state(
    state: &AppState,
    path: &str,
    credential: Option<String>,
) -> Result<AuthState<Identity>> {
    let Some(credential) = credential else {
        return Ok(AuthState::Unauthenticated);
    };

    match state.sessions() {
        ServiceStatus::Available(resolver) => Ok(resolver.resolve(Some(&credential)).await),
        ServiceStatus::Unavailable(_) if state.gate().classify(path) == RouteClass::Public => {
            Ok(AuthState::Unauthenticated)
        }
        ServiceStatus::Unavailable(_) => Err(AppError::ServiceUnavailable("identity")),
    }
}

/// Any page under `/account`.
#[instrument(skip_all, fields(path = %uri.path()))]
pub async fn page(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    IdentityCredential(credential): IdentityCredential,
) -> Result<Response> {
    let path = uri.path();
    let auth = auth_state(&state, path, credential).await?;
    let signed_in_as = auth.identity().map(display_name);

    let response = match state.gate().decide(path, &auth) {
        GateDecision::Render => render_public(path, signed_in_as)?,
        GateDecision::Loading => (
            [(header::CACHE_CONTROL, "no-store")],
            LoadingTemplate {
                refresh_seconds: LOADING_REFRESH_SECONDS,
            },
        )
            .into_response(),
        GateDecision::Redirect { to } => {
            debug!(to = %to, "Redirecting to login");
            Redirect::to(&to).into_response()
        }
        GateDecision::Protected { breadcrumbs } => {
            if let Some(identity) = auth.identity() {
                set_sentry_user(&identity.uid);
            }
            let title = breadcrumbs
                .last()
                .map_or_else(|| "My Account".to_string(), |crumb| crumb.label.clone());
            (
                [(header::CACHE_CONTROL, "private, no-store")],
                AccountPageTemplate {
                    title,
                    breadcrumbs,
                    signed_in_as: signed_in_as.unwrap_or_default(),
                },
            )
                .into_response()
        }
    };

    Ok(response)
}

fn render_public(path: &str, signed_in_as: Option<String>) -> Result<Response> {
    match path.trim_end_matches('/') {
        "/account/login" => Ok(LoginTemplate { signed_in_as }.into_response()),
        "/account/register" => Ok(RegisterTemplate { signed_in_as }.into_response()),
        other => Err(AppError::NotFound(other.to_string())),
    }
}
