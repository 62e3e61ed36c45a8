//! Shipping partner API client.
//!
//! The partner generates invoices for shipped orders. Looking one up takes
//! three calls: log in for an API token, search the order by its storefront
//! order number, then ask for the invoice of the partner's order id.
//!
//! The token is cached in memory and re-issued when it ages out or the
//! partner answers 401.

use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

/// Tokens are issued for ten days; refresh a day early.
const TOKEN_TTL: Duration = Duration::from_secs(9 * 24 * 60 * 60);

/// Errors that can occur when talking to the shipping partner.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The partner refused the configured credentials.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No order matches the order number.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The order exists but has no invoice yet.
    #[error("Invoice not available for order {0}")]
    InvoiceUnavailable(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A generated invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    /// Storefront order number the invoice was requested for.
    pub order_number: String,
    /// Download link for the invoice PDF.
    pub invoice_url: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    issued_at: Instant,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        self.issued_at.elapsed() >= TOKEN_TTL
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderSearchResponse {
    #[serde(default)]
    data: Vec<PartnerOrder>,
}

#[derive(Debug, Deserialize)]
struct PartnerOrder {
    id: i64,
    #[serde(default)]
    channel_order_id: String,
}

#[derive(Debug, Serialize)]
struct InvoiceRequest {
    ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct InvoiceResponse {
    #[serde(default)]
    is_invoice_created: bool,
    invoice_url: Option<String>,
}

/// Shipping partner API client.
#[derive(Clone)]
pub struct ShippingClient {
    inner: Arc<ShippingClientInner>,
}

struct ShippingClientInner {
    client: reqwest::Client,
    base_url: String,
    email: String,
    password: SecretString,
    /// In-memory token cache
    token: RwLock<Option<CachedToken>>,
}

impl ShippingClient {
    /// Create a client for the partner API at `base_url`.
    #[must_use]
    pub fn new(base_url: &str, email: String, password: SecretString) -> Self {
        Self {
            inner: Arc::new(ShippingClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                email,
                password,
                token: RwLock::new(None),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Return the cached token, logging in first if there is none.
    async fn token(&self) -> Result<String, ShippingError> {
        if let Some(token) = self.inner.token.read().await.as_ref()
            && !token.is_expired()
        {
            return Ok(token.value.clone());
        }

        let mut slot = self.inner.token.write().await;
        // Another request may have logged in while we waited for the lock
        if let Some(token) = slot.as_ref()
            && !token.is_expired()
        {
            return Ok(token.value.clone());
        }

        let value = self.login().await?;
        *slot = Some(CachedToken {
            value: value.clone(),
            issued_at: Instant::now(),
        });
        Ok(value)
    }

    async fn clear_token(&self) {
        *self.inner.token.write().await = None;
    }

    #[instrument(skip(self), fields(email = %self.inner.email))]
    async fn login(&self) -> Result<String, ShippingError> {
        let response = self
            .inner
            .client
            .post(self.url("/v1/external/auth/login"))
            .json(&LoginRequest {
                email: &self.inner.email,
                password: self.inner.password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ShippingError::AuthenticationFailed);
        }
        let login: LoginResponse = parse(response).await?;
        login.token.ok_or(ShippingError::AuthenticationFailed)
    }

    /// Send an authorized request, re-authenticating once on 401.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response, ShippingError>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    {
        let token = self.token().await?;
        let response = build(&self.inner.client, &token).send().await?;
        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!("Shipping partner token rejected, logging in again");
        self.clear_token().await;
        let token = self.token().await?;
        Ok(build(&self.inner.client, &token).send().await?)
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// Fetch the invoice for a storefront order number.
    ///
    /// # Errors
    ///
    /// Returns `ShippingError::OrderNotFound` if the partner has no such
    /// order, `ShippingError::InvoiceUnavailable` if it has not generated an
    /// invoice, or another variant if the partner API fails.
    #[instrument(skip(self))]
    pub async fn invoice_for(&self, order_number: &str) -> Result<Invoice, ShippingError> {
        let search = order_number.trim().trim_start_matches('#');
        if search.is_empty() {
            return Err(ShippingError::OrderNotFound(order_number.to_string()));
        }

        let url = self.url("/v1/external/orders");
        let response = self
            .send(|client, token| {
                client
                    .get(&url)
                    .bearer_auth(token)
                    .query(&[("search", search)])
            })
            .await?;
        let orders: OrderSearchResponse = parse(response).await?;

        let order = select_order(orders.data, search)
            .ok_or_else(|| ShippingError::OrderNotFound(search.to_string()))?;

        let url = self.url("/v1/external/orders/print/invoice");
        let response = self
            .send(|client, token| {
                client
                    .post(&url)
                    .bearer_auth(token)
                    .json(&InvoiceRequest { ids: vec![order.id] })
            })
            .await?;
        let invoice: InvoiceResponse = parse(response).await?;

        match invoice.invoice_url {
            Some(invoice_url) if invoice.is_invoice_created && !invoice_url.is_empty() => {
                Ok(Invoice {
                    order_number: search.to_string(),
                    invoice_url,
                })
            }
            _ => Err(ShippingError::InvoiceUnavailable(search.to_string())),
        }
    }
}

/// Prefer the order whose channel order id matches exactly.
fn select_order(orders: Vec<PartnerOrder>, search: &str) -> Option<PartnerOrder> {
    let exact = orders
        .iter()
        .position(|order| order.channel_order_id.trim_start_matches('#') == search);
    orders.into_iter().nth(exact.unwrap_or(0))
}

async fn parse<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ShippingError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ShippingError::Api {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json()
        .await
        .map_err(|e| ShippingError::Parse(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> ShippingClient {
        ShippingClient::new(
            &server.uri(),
            "ops@meadowlark.shop".to_string(),
            SecretString::from("partner-password"),
        )
    }

    async fn mount_login(server: &MockServer, token: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/v1/external/auth/login"))
            .and(body_json(serde_json::json!({
                "email": "ops@meadowlark.shop",
                "password": "partner-password"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": token
            })))
            .expect(times)
            .mount(server)
            .await;
    }

    async fn mount_invoice(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v1/external/orders/print/invoice"))
            .and(body_json(serde_json::json!({ "ids": [881] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "is_invoice_created": true,
                "invoice_url": "https://partner.example/invoices/881.pdf"
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_invoice_lookup_flow() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/external/orders"))
            .and(query_param("search", "1042"))
            .and(header("Authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "id": 770, "channel_order_id": "10421" },
                    { "id": 881, "channel_order_id": "#1042" }
                ]
            })))
            .mount(&server)
            .await;
        mount_invoice(&server).await;

        let client = client_for(&server);
        let invoice = client.invoice_for("#1042").await.unwrap();
        assert_eq!(invoice.order_number, "1042");
        assert_eq!(invoice.invoice_url, "https://partner.example/invoices/881.pdf");

        // Token is reused for the second lookup (login expects exactly one call)
        client.invoice_for("1042").await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/external/orders"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).invoice_for("9999").await.unwrap_err();
        assert!(matches!(err, ShippingError::OrderNotFound(n) if n == "9999"));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/external/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).invoice_for("1042").await.unwrap_err();
        assert!(matches!(err, ShippingError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_invoice_not_generated() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1", 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/external/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "id": 881, "channel_order_id": "1042" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/external/orders/print/invoice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "is_invoice_created": false
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).invoice_for("1042").await.unwrap_err();
        assert!(matches!(err, ShippingError::InvoiceUnavailable(_)));
    }

    #[test]
    fn test_select_order_falls_back_to_first() {
        let orders = vec![
            PartnerOrder {
                id: 1,
                channel_order_id: "A-1".to_string(),
            },
            PartnerOrder {
                id: 2,
                channel_order_id: "A-2".to_string(),
            },
        ];
        assert_eq!(select_order(orders, "1042").map(|o| o.id), Some(1));
        assert!(select_order(Vec::new(), "1042").is_none());
    }
}
