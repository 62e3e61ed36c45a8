//! Newsletter sign-up handler.
//!
//! Accepts the footer form post. Signing up twice with the same address is
//! reported as success.

use axum::{Form, Json, extract::State};
use meadowlark_core::Email;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::db::{NewsletterSignup, SubmissionRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
}

/// Sign-up result.
#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub already_subscribed: bool,
}

/// Subscribe an email address.
#[instrument(skip(state), fields(email = %form.email))]
pub async fn subscribe(
    State(state): State<AppState>,
    Form(form): Form<SubscribeForm>,
) -> Result<Json<SubscribeResponse>> {
    let email = Email::parse(&form.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address.".to_string()))?;

    let outcome = SubmissionRepository::new(state.pool())
        .create_newsletter_signup(&email)
        .await?;

    let already_subscribed = match outcome {
        NewsletterSignup::Created(id) => {
            info!(id = id.as_i32(), "Newsletter sign-up stored");
            false
        }
        NewsletterSignup::AlreadySubscribed => {
            info!("Email already subscribed - treating as success");
            true
        }
    };

    Ok(Json(SubscribeResponse {
        success: true,
        already_subscribed,
    }))
}
