//! Contact form handler.
//!
//! Submissions are appended to the document store; nothing is ever updated.

use axum::{Json, extract::State, http::StatusCode};
use meadowlark_core::Email;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::db::SubmissionRepository;
use crate::error::{AppError, Result};
use crate::models::NewContactSubmission;
use crate::state::AppState;

/// Longest message accepted from the form.
const MAX_MESSAGE_LENGTH: usize = 5000;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
}

/// Response for form submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub id: i32,
}

impl ContactForm {
    /// Trim and validate into a submission.
    fn validate(self) -> Result<NewContactSubmission> {
        let email = Email::parse(&self.email)
            .map_err(|_| AppError::BadRequest("Please enter a valid email address.".to_string()))?;

        let name = self.name.trim();
        let message = self.message.trim();
        if name.is_empty() || message.is_empty() {
            return Err(AppError::BadRequest(
                "Name and message are required.".to_string(),
            ));
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(AppError::BadRequest(format!(
                "Message must be at most {MAX_MESSAGE_LENGTH} characters."
            )));
        }

        Ok(NewContactSubmission {
            name: name.to_string(),
            email,
            phone: self
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            message: message.to_string(),
        })
    }
}

/// Store a contact form submission.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<ContactResponse>)> {
    let submission = form.validate()?;

    let stored = SubmissionRepository::new(state.pool())
        .create_contact(&submission)
        .await?;

    info!(id = %stored.id.as_i32(), "Contact submission stored");
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            id: stored.id.as_i32(),
        }),
    ))
}
