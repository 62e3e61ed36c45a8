//! Profile repository.
//!
//! Queries are checked at runtime (`query_as`) so the crate builds without a
//! live database.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use meadowlark_core::{Email, PhoneNumber, ProfileId};

use super::RepositoryError;
use crate::models::{Profile, ProfileUpdate};
use crate::services::identity::Identity;

const PROFILE_COLUMNS: &str = "id, key, uid, phone, name, email, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: ProfileId,
    key: String,
    uid: String,
    phone: Option<String>,
    name: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let phone = row
            .phone
            .as_deref()
            .map(PhoneNumber::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid phone in database: {e}")))?;
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;

        Ok(Self {
            id: row.id,
            key: row.key,
            uid: row.uid,
            phone,
            name: row.name,
            email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by its key (phone number or uid).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get_by_key(&self, key: &str) -> Result<Option<Profile>, RepositoryError> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM storefront.profile WHERE key = $1"
        ))
        .bind(key)
        .fetch_optional(self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    /// Create or update the profile for a verified identity.
    ///
    /// The identity's uid and phone always overwrite the stored values;
    /// `name` and `email` are only overwritten when supplied.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        identity: &Identity,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let row: ProfileRow = sqlx::query_as(&format!(
            r"
            INSERT INTO storefront.profile (key, uid, phone, name, email)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (key) DO UPDATE SET
                uid = EXCLUDED.uid,
                phone = EXCLUDED.phone,
                name = COALESCE(EXCLUDED.name, storefront.profile.name),
                email = COALESCE(EXCLUDED.email, storefront.profile.email),
                updated_at = now()
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(identity.profile_key())
        .bind(&identity.uid)
        .bind(identity.phone.as_ref().map(PhoneNumber::as_str))
        .bind(update.name.as_deref())
        .bind(update.email.as_ref().map(Email::as_str))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "profile"))?;

        Profile::try_from(row)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(phone: Option<&str>, email: Option<&str>) -> ProfileRow {
        ProfileRow {
            id: ProfileId::new(1),
            key: phone.unwrap_or("uid-1").to_string(),
            uid: "uid-1".to_string(),
            phone: phone.map(str::to_string),
            name: Some("Ada".to_string()),
            email: email.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let profile = Profile::try_from(row(Some("+15551234567"), Some("ada@example.com"))).unwrap();
        assert_eq!(profile.phone.unwrap().as_str(), "+15551234567");
        assert_eq!(profile.email.unwrap().as_str(), "ada@example.com");
    }

    #[test]
    fn test_corrupt_phone_is_reported() {
        let err = Profile::try_from(row(Some("not-a-phone"), None)).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(msg) if msg.contains("phone")));
    }
}
