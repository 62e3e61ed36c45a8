//! Profile endpoints.
//!
//! A profile is created the first time a verified identity posts to
//! `/api/users` and updated on every later post. It is keyed by the verified
//! phone number, or the identity's uid when there is none.

use axum::{Json, extract::State};
use meadowlark_core::Email;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::middleware::BearerIdentity;
use crate::models::{Profile, ProfileUpdate};
use crate::services::identity::Identity;
use crate::state::AppState;

/// Longest display name accepted.
const MAX_NAME_LENGTH: usize = 200;

/// Profile fields a client may send.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ProfileRequest {
    fn validate(self) -> Result<ProfileUpdate> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if name
            .as_ref()
            .is_some_and(|n| n.chars().count() > MAX_NAME_LENGTH)
        {
            return Err(AppError::BadRequest(format!(
                "Name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }

        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(ProfileUpdate { name, email })
    }
}

/// The caller's identity and stored profile.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub identity: Identity,
    pub profile: Option<Profile>,
}

/// Create or update the caller's profile.
#[instrument(skip_all, fields(uid = %identity.uid))]
pub async fn upsert(
    State(state): State<AppState>,
    BearerIdentity(identity): BearerIdentity,
    body: Option<Json<ProfileRequest>>,
) -> Result<Json<Profile>> {
    let update = body.map(|Json(request)| request).unwrap_or_default().validate()?;

    let profile = ProfileRepository::new(state.pool())
        .upsert(&identity, &update)
        .await?;

    info!(profile_id = profile.id.as_i32(), "Profile saved");
    Ok(Json(profile))
}

/// The caller's identity and profile, if one has been saved.
#[instrument(skip_all, fields(uid = %identity.uid))]
pub async fn me(
    State(state): State<AppState>,
    BearerIdentity(identity): BearerIdentity,
) -> Result<Json<MeResponse>> {
    let profile = ProfileRepository::new(state.pool())
        .get_by_key(identity.profile_key())
        .await?;

    Ok(Json(MeResponse { identity, profile }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_left_unchanged() {
        let update = ProfileRequest {
            name: Some("   ".to_string()),
            email: Some(String::new()),
        }
        .validate()
        .unwrap();
        assert_eq!(update.name, None);
        assert_eq!(update.email, None);
    }

    #[test]
    fn test_invalid_email_is_bad_request() {
        let err = ProfileRequest {
            name: None,
            email: Some("nope".to_string()),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_overlong_name_is_bad_request() {
        let request = ProfileRequest {
            name: Some("n".repeat(MAX_NAME_LENGTH + 1)),
            email: None,
        };
        assert!(request.validate().is_err());
    }
}
