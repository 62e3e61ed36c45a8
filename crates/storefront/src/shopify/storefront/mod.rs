//! Shopify Storefront API client implementation.
//!
//! Operations are [`graphql_client::GraphQLQuery`] implementations sent with
//! `reqwest` 0.13. Products and collections are cached using `moka`
//! (5-minute TTL); customer operations are never cached.

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, PathFragment, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{
    Collection, CollectionSummary, Customer, CustomerAccessToken, CustomerCreateInput, Page,
    ProductCard, ProductDetail,
};
use crate::shopify::ShopifyError;

use cache::CacheValue;
use conversions::{
    convert_collection, convert_collection_summary, convert_product_connection,
    convert_product_detail,
};
use queries::{
    CollectionByHandleVariables, CollectionsVariables, CredentialsInput,
    CustomerAccessTokenCreate, CustomerAccessTokenDelete, CustomerCreate,
    CustomerCreateVariables, CustomerUserError, CustomerVariables, GetCollectionByHandle,
    GetCollections, GetCustomer, GetProductByHandle, GetProducts, IMAGE_COUNT,
    ProductByHandleVariables, ProductsVariables, TokenCreateVariables, TokenDeleteVariables,
    VARIANT_COUNT,
};

/// Largest page size the Storefront API accepts.
pub const MAX_PAGE_SIZE: i64 = 250;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 24;

/// Clamp a requested page size into the range the API accepts.
#[must_use]
pub fn page_size(first: Option<i64>) -> i64 {
    first.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; all clones share one HTTP client and one cache.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<String, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint.clone(),
                access_token: config.storefront_token.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// The GraphQL endpoint this client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header("Shopify-Storefront-Private-Token", &self.inner.access_token)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&body, 500),
                operation = request_body.operation_name,
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let response: Response<Q::ResponseData> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body, 500),
                operation = request_body.operation_name,
                "Failed to parse Shopify GraphQL response"
            );
            ShopifyError::Parse(e)
        })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.iter().map(describe_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %truncate(&body, 500),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::EmptyResponse(request_body.operation_name)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product page by its handle.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no product has this handle, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<ProductDetail, ShopifyError> {
        let cache_key = cache::product_key(handle);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let data = self
            .execute::<GetProductByHandle>(ProductByHandleVariables {
                handle: handle.to_string(),
                image_count: IMAGE_COUNT,
                variant_count: VARIANT_COUNT,
            })
            .await?;

        let product = data
            .product
            .map(convert_product_detail)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: Option<i64>,
        after: Option<String>,
    ) -> Result<Page<ProductCard>, ShopifyError> {
        let first = page_size(first);
        let cache_key = cache::products_key(first, after.as_deref());

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let data = self
            .execute::<GetProducts>(ProductsVariables {
                first,
                after,
                image_count: IMAGE_COUNT,
                variant_count: VARIANT_COUNT,
            })
            .await?;

        let page = convert_product_connection(data.products);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get a collection page by handle, with one page of its products.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no collection has this handle, or
    /// an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        first: Option<i64>,
        after: Option<String>,
    ) -> Result<Collection, ShopifyError> {
        let first = page_size(first);
        let cache_key = cache::collection_key(handle, first, after.as_deref());

        if let Some(CacheValue::Collection(collection)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collection");
            return Ok(*collection);
        }

        let data = self
            .execute::<GetCollectionByHandle>(CollectionByHandleVariables {
                handle: handle.to_string(),
                first,
                after,
                image_count: IMAGE_COUNT,
                variant_count: VARIANT_COUNT,
            })
            .await?;

        let collection = data
            .collection
            .map(convert_collection)
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Collection(Box::new(collection.clone())),
            )
            .await;

        Ok(collection)
    }

    /// Get a page of collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        first: Option<i64>,
        after: Option<String>,
    ) -> Result<Page<CollectionSummary>, ShopifyError> {
        let first = page_size(first);
        let cache_key = cache::collections_key(first, after.as_deref());

        if let Some(CacheValue::Collections(collections)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let data = self
            .execute::<GetCollections>(CollectionsVariables { first, after })
            .await?;

        let page = Page {
            items: data
                .collections
                .nodes
                .into_iter()
                .map(convert_collection_summary)
                .collect(),
            page_info: data.collections.page_info,
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Collections(page.clone()))
            .await;

        Ok(page)
    }

    // =========================================================================
    // Customer Methods
    // =========================================================================

    /// Exchange email and password for a customer access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` if the credentials are rejected, or
    /// an error if the API request fails.
    #[instrument(skip(self, password))]
    pub async fn create_customer_access_token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let data = self
            .execute::<CustomerAccessTokenCreate>(TokenCreateVariables {
                input: CredentialsInput {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            })
            .await?;

        let payload = data
            .customer_access_token_create
            .ok_or_else(|| ShopifyError::EmptyResponse("customerAccessTokenCreate"))?;

        check_user_errors(&payload.customer_user_errors)?;

        payload
            .customer_access_token
            .ok_or(ShopifyError::InvalidCustomerToken)
    }

    /// Revoke a customer access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn delete_customer_access_token(&self, token: &str) -> Result<(), ShopifyError> {
        let data = self
            .execute::<CustomerAccessTokenDelete>(TokenDeleteVariables {
                customer_access_token: token.to_string(),
            })
            .await?;

        let deleted = data
            .customer_access_token_delete
            .and_then(|payload| payload.deleted_access_token)
            .is_some();
        debug!(deleted, "Customer access token delete");
        Ok(())
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` if Shopify rejects the input (e.g.
    /// the email is taken), or an error if the API request fails.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_customer(
        &self,
        input: CustomerCreateInput,
    ) -> Result<Customer, ShopifyError> {
        let data = self
            .execute::<CustomerCreate>(CustomerCreateVariables { input })
            .await?;

        let payload = data
            .customer_create
            .ok_or_else(|| ShopifyError::EmptyResponse("customerCreate"))?;

        check_user_errors(&payload.customer_user_errors)?;

        payload
            .customer
            .ok_or_else(|| ShopifyError::UserError("Customer was not created".to_string()))
    }

    /// Look up the customer a token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::InvalidCustomerToken` if the token is unknown or
    /// expired, or an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_customer(&self, token: &str) -> Result<Customer, ShopifyError> {
        let data = self
            .execute::<GetCustomer>(CustomerVariables {
                customer_access_token: token.to_string(),
            })
            .await?;

        data.customer.ok_or(ShopifyError::InvalidCustomerToken)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// One line per GraphQL error: the message, then the response path if any.
fn describe_graphql_error(error: &graphql_client::Error) -> String {
    let path = error
        .path
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|fragment| match fragment {
            PathFragment::Key(key) => key.clone(),
            PathFragment::Index(index) => index.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".");

    if path.is_empty() {
        error.message.clone()
    } else {
        format!("{} (at {path})", error.message)
    }
}

fn check_user_errors(errors: &[CustomerUserError]) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(ShopifyError::UserError(
        errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> StorefrontClient {
        StorefrontClient::new(&ShopifyStorefrontConfig {
            store: "meadowlark.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            endpoint: format!("{}/api/2026-01/graphql.json", server.uri()),
            storefront_token: SecretString::from("test-token"),
        })
    }

    #[test]
    fn test_page_size_clamps() {
        assert_eq!(page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(page_size(Some(0)), 1);
        assert_eq!(page_size(Some(1000)), MAX_PAGE_SIZE);
        assert_eq!(page_size(Some(12)), 12);
    }

    #[test]
    fn test_check_user_errors_joins_messages() {
        let errors = vec![
            CustomerUserError {
                code: Some("TAKEN".to_string()),
                message: "Email has already been taken".to_string(),
            },
            CustomerUserError {
                code: None,
                message: "Password is too short".to_string(),
            },
        ];
        let err = check_user_errors(&errors).unwrap_err();
        assert_eq!(
            err.to_string(),
            "User error: Email has already been taken; Password is too short"
        );
        assert!(check_user_errors(&[]).is_ok());
    }

    #[tokio::test]
    async fn test_get_collections_sends_private_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/2026-01/graphql.json"))
            .and(header("Shopify-Storefront-Private-Token", "test-token"))
            .and(body_partial_json(serde_json::json!({
                "operationName": "GetCollections",
                "variables": { "first": 5 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "collections": {
                    "nodes": [{ "handle": "summer", "title": "Summer", "description": "", "image": null }],
                    "pageInfo": { "hasNextPage": true, "endCursor": "abc" }
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let page = client.get_collections(Some(5), None).await.unwrap();
        assert_eq!(page.items[0].handle, "summer");
        assert_eq!(page.page_info.end_cursor.as_deref(), Some("abc"));

        // Second call is served from the cache
        let again = client.get_collections(Some(5), None).await.unwrap();
        assert_eq!(again.items.len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_products(None, None).await.unwrap_err();
        assert!(matches!(err, ShopifyError::RateLimited(7)));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": { "product": null } })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_product_by_handle("ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, ShopifyError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_graphql_errors_surface() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [{ "message": "Throttled" }]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).get_customer("tok").await.unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: Throttled");
    }

    #[tokio::test]
    async fn test_graphql_error_paths_are_described() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [
                    { "message": "Access denied", "path": ["products", "edges", 0] },
                    { "message": "Invalid cursor" }
                ]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).get_collections(Some(5), None).await.unwrap_err();
        assert!(matches!(
            &err,
            ShopifyError::GraphQL(lines)
                if lines == &["Access denied (at products.edges.0)", "Invalid cursor"]
        ));
    }

    #[tokio::test]
    async fn test_error_status_and_empty_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;
        let err = client_for(&server).get_customer("tok").await.unwrap_err();
        assert!(matches!(err, ShopifyError::Status { status: 502, body } if body == "bad gateway"));

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        let err = client_for(&server).get_customer("tok").await.unwrap_err();
        assert!(matches!(err, ShopifyError::EmptyResponse("GetCustomer")));
    }

    #[tokio::test]
    async fn test_token_create_user_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "customerAccessTokenCreate": {
                    "customerAccessToken": null,
                    "customerUserErrors": [{ "code": "UNIDENTIFIED_CUSTOMER", "message": "Unidentified customer" }]
                }}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_customer_access_token("a@b.co", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, ShopifyError::UserError(msg) if msg == "Unidentified customer"));
    }

    #[tokio::test]
    async fn test_unknown_customer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": { "customer": null } })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).get_customer("stale").await.unwrap_err();
        assert!(matches!(err, ShopifyError::InvalidCustomerToken));
    }
}
