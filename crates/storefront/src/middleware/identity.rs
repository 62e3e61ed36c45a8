//! Identity credential extractors.
//!
//! The account area reads the identity provider's ID token from the
//! `__session` cookie (set by the sign-in page) or an `Authorization: Bearer`
//! header. The JSON API accepts only the header.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use super::customer_token::cookie_value;
use crate::error::AppError;
use crate::services::identity::Identity;
use crate::state::AppState;

/// Cookie holding the identity provider's ID token.
pub const IDENTITY_COOKIE: &str = "__session";

/// Bearer token from the `Authorization` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// The visitor's identity credential, if they sent one.
///
/// Does not verify anything; see [`crate::services::session::SessionResolver`].
pub struct IdentityCredential(pub Option<String>);

impl<S> FromRequestParts<S> for IdentityCredential
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            bearer_token(&parts.headers).or_else(|| cookie_value(&parts.headers, IDENTITY_COOKIE)),
        ))
    }
}

/// Extractor that requires a verified bearer identity.
///
/// Rejects with 401 when the header is missing or the token is refused, and
/// with 503 when no identity provider is configured.
pub struct BearerIdentity(pub Identity);

impl FromRequestParts<AppState> for BearerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let identity = state
            .sessions()
            .require("identity")?
            .verifier()
            .verify_token(&token)
            .await?;

        crate::error::set_sentry_user(&identity.uid);
        Ok(Self(identity))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).as_deref(), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer  xyz ")).as_deref(), Some("xyz"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
