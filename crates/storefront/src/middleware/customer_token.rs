//! Customer access token cookie.
//!
//! After an email/password login the storefront hands the browser Shopify's
//! opaque customer access token in an HTTP-only cookie. Every later request
//! carries it back; it is never readable from page scripts.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

/// Cookie holding the customer access token.
pub const CUSTOMER_TOKEN_COOKIE: &str = "customerAccessToken";

/// Customer token lifetime in seconds (30 days).
pub const CUSTOMER_TOKEN_MAX_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Read a cookie value from the request headers.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

fn build(value: String, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((CUSTOMER_TOKEN_COOKIE, value))
        .path("/")
        .max_age(Duration::seconds(max_age_seconds))
        .secure(secure)
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn to_header(cookie: &Cookie<'_>) -> HeaderValue {
    // Token values are Shopify-issued ASCII; anything else is dropped
    HeaderValue::from_str(&cookie.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("customerAccessToken=; Path=/; Max-Age=0"))
}

/// `Set-Cookie` value storing `token` for 30 days.
#[must_use]
pub fn set_customer_token(token: &str, secure: bool) -> HeaderValue {
    to_header(&build(token.to_string(), CUSTOMER_TOKEN_MAX_AGE_SECONDS, secure))
}

/// `Set-Cookie` value deleting the token (`Max-Age=0`).
#[must_use]
pub fn clear_customer_token(secure: bool) -> HeaderValue {
    to_header(&build(String::new(), 0, secure))
}

/// Extractor for the customer access token cookie, if present.
pub struct CustomerToken(pub Option<String>);

impl<S> FromRequestParts<S> for CustomerToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(cookie_value(&parts.headers, CUSTOMER_TOKEN_COOKIE)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_cookie_attributes() {
        let value = set_customer_token("tok-123", true);
        let value = value.to_str().unwrap_or_default();
        assert!(value.starts_with("customerAccessToken=tok-123"));
        assert!(value.contains("Max-Age=2592000"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Secure"));
    }

    #[test]
    fn test_clear_cookie() {
        let value = clear_customer_token(false);
        let value = value.to_str().unwrap_or_default();
        assert!(value.contains("Max-Age=0"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn test_cookie_value_among_many() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("mdl_session=abc; customerAccessToken=tok-9; theme=dark"),
        );
        assert_eq!(
            cookie_value(&headers, CUSTOMER_TOKEN_COOKIE).as_deref(),
            Some("tok-9")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("customerAccessToken="));
        assert_eq!(cookie_value(&headers, CUSTOMER_TOKEN_COOKIE), None);
    }
}
