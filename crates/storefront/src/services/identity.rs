//! Phone identity provider client.
//!
//! Visitors sign in to the account area with a phone number through a hosted
//! identity provider, which hands the browser a short-lived ID token. The
//! storefront never sees the phone login itself; it only asks the provider
//! who a token belongs to.

use meadowlark_core::PhoneNumber;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur when verifying an ID token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the token (expired, revoked or malformed).
    #[error("Identity token rejected")]
    InvalidToken,

    /// API returned an unexpected error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl IdentityError {
    /// Whether the provider answered and said no.
    ///
    /// Anything else is a failure to get an answer, which is worth retrying.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidToken)
    }
}

/// A verified identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Provider subject id.
    pub uid: String,
    /// Verified phone number, when the account has one.
    pub phone: Option<PhoneNumber>,
}

impl Identity {
    /// Key for the visitor's profile record: phone number if present, else uid.
    #[must_use]
    pub fn profile_key(&self) -> &str {
        self.phone.as_ref().map_or(self.uid.as_str(), PhoneNumber::as_str)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    phone_number: Option<String>,
}

/// Client for the identity provider's account lookup endpoint.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    lookup_url: String,
    api_key: SecretString,
}

impl IdentityClient {
    /// Create a client for the provider at `base_url`.
    #[must_use]
    pub fn new(base_url: &str, api_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            lookup_url: format!("{}/v1/accounts:lookup", base_url.trim_end_matches('/')),
            api_key,
        }
    }

    /// Resolve an ID token to the identity it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidToken` if the provider rejects the
    /// token, or another variant if the provider could not be reached.
    #[instrument(skip_all)]
    pub async fn verify_token(&self, id_token: &str) -> Result<Identity, IdentityError> {
        let response = self
            .client
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&LookupRequest { id_token })
            .send()
            .await?;

        let status = response.status();

        // The provider answers 400 for tokens it will not accept
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(IdentityError::InvalidToken);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        let user = lookup
            .users
            .into_iter()
            .next()
            .ok_or(IdentityError::InvalidToken)?;

        let phone = user.phone_number.and_then(|raw| match PhoneNumber::parse(&raw) {
            Ok(phone) => Some(phone),
            Err(e) => {
                tracing::warn!(error = %e, "Identity provider returned an unusable phone number");
                None
            }
        });

        Ok(Identity {
            uid: user.local_id,
            phone,
        })
    }
}
