//! Contact and newsletter submission repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use meadowlark_core::{Email, SignupId, SubmissionId};

use super::RepositoryError;
use crate::models::{ContactSubmission, NewContactSubmission};

/// Outcome of a newsletter sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsletterSignup {
    /// A new sign-up was stored.
    Created(SignupId),
    /// The email was already signed up; nothing changed.
    AlreadySubscribed,
}

/// Repository for append-only form submissions.
pub struct SubmissionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubmissionRepository<'a> {
    /// Create a new submission repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a contact form submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_contact(
        &self,
        submission: &NewContactSubmission,
    ) -> Result<ContactSubmission, RepositoryError> {
        let (id, created_at): (SubmissionId, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO storefront.contact_submission (name, email, phone, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            ",
        )
        .bind(&submission.name)
        .bind(submission.email.as_str())
        .bind(submission.phone.as_deref())
        .bind(&submission.message)
        .fetch_one(self.pool)
        .await?;

        Ok(ContactSubmission { id, created_at })
    }

    /// Store a newsletter sign-up; repeating an email is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_newsletter_signup(
        &self,
        email: &Email,
    ) -> Result<NewsletterSignup, RepositoryError> {
        let id: Option<(SignupId,)> = sqlx::query_as(
            r"
            INSERT INTO storefront.newsletter_signup (email)
            VALUES ($1)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(id.map_or(NewsletterSignup::AlreadySubscribed, |(id,)| {
            NewsletterSignup::Created(id)
        }))
    }
}
