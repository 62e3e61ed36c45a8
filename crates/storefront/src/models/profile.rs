//! Profile and form submission domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use meadowlark_core::{Email, PhoneNumber, ProfileId, SubmissionId};

/// A visitor profile keyed by phone number (or identity subject id).
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    /// Database ID.
    pub id: ProfileId,
    /// Lookup key: the phone number if known, else `uid`.
    pub key: String,
    /// Identity provider subject id.
    pub uid: String,
    /// Verified phone number.
    pub phone: Option<PhoneNumber>,
    /// Display name.
    pub name: Option<String>,
    /// Contact email.
    pub email: Option<Email>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied profile fields.
///
/// `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
}

/// A contact form submission to store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContactSubmission {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub message: String,
}

/// A stored contact form submission.
#[derive(Debug, Clone, Serialize)]
pub struct ContactSubmission {
    pub id: SubmissionId,
    pub created_at: DateTime<Utc>,
}
