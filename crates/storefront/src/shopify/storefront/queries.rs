//! GraphQL operations for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] with its
//! document, variables and response shape declared here.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

use crate::shopify::types::{
    Customer, CustomerAccessToken, CustomerCreateInput, Image, PageInfo,
};

/// Number of images fetched per product.
pub const IMAGE_COUNT: i64 = 10;
/// Number of variants fetched per product.
pub const VARIANT_COUNT: i64 = 50;

macro_rules! graphql_operation {
    ($name:ident, $document:expr, $variables:ty, $response:ty) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $variables;
            type ResponseData = $response;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: stringify!($name),
                }
            }
        }
    };
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyNode {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeNode {
    pub min_variant_price: MoneyNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub nodes: Vec<T>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub price: MoneyNode,
    pub compare_at_price: Option<MoneyNode>,
    pub image: Option<Image>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_html: String,
    pub available_for_sale: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub featured_image: Option<Image>,
    pub images: Nodes<Image>,
    pub price_range: PriceRangeNode,
    pub compare_at_price_range: Option<PriceRangeNode>,
    pub variants: Nodes<VariantNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionNode {
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionWithProductsNode {
    #[serde(flatten)]
    pub collection: CollectionNode,
    pub products: Connection<ProductNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerUserError {
    pub code: Option<String>,
    pub message: String,
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductByHandleVariables {
    pub handle: String,
    pub image_count: i64,
    pub variant_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductByHandleData {
    pub product: Option<ProductNode>,
}

graphql_operation!(
    GetProductByHandle,
    concat!(
        r"
query GetProductByHandle($handle: String!, $imageCount: Int!, $variantCount: Int!) {
  product(handle: $handle) { ...ProductFields }
}
",
        include_str!("fragments/product.graphql")
    ),
    ProductByHandleVariables,
    ProductByHandleData
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsVariables {
    pub first: i64,
    pub after: Option<String>,
    pub image_count: i64,
    pub variant_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductsData {
    pub products: Connection<ProductNode>,
}

graphql_operation!(
    GetProducts,
    concat!(
        r"
query GetProducts($first: Int!, $after: String, $imageCount: Int!, $variantCount: Int!) {
  products(first: $first, after: $after) {
    nodes { ...ProductFields }
    pageInfo { hasNextPage endCursor }
  }
}
",
        include_str!("fragments/product.graphql")
    ),
    ProductsVariables,
    ProductsData
);

// =============================================================================
// Collections
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CollectionsVariables {
    pub first: i64,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionsData {
    pub collections: Connection<CollectionNode>,
}

graphql_operation!(
    GetCollections,
    r"
query GetCollections($first: Int!, $after: String) {
  collections(first: $first, after: $after) {
    nodes { handle title description image { url altText width height } }
    pageInfo { hasNextPage endCursor }
  }
}
",
    CollectionsVariables,
    CollectionsData
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionByHandleVariables {
    pub handle: String,
    pub first: i64,
    pub after: Option<String>,
    pub image_count: i64,
    pub variant_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionByHandleData {
    pub collection: Option<CollectionWithProductsNode>,
}

graphql_operation!(
    GetCollectionByHandle,
    concat!(
        r"
query GetCollectionByHandle(
  $handle: String!, $first: Int!, $after: String, $imageCount: Int!, $variantCount: Int!
) {
  collection(handle: $handle) {
    handle
    title
    description
    image { url altText width height }
    products(first: $first, after: $after) {
      nodes { ...ProductFields }
      pageInfo { hasNextPage endCursor }
    }
  }
}
",
        include_str!("fragments/product.graphql")
    ),
    CollectionByHandleVariables,
    CollectionByHandleData
);

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CredentialsInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenCreateVariables {
    pub input: CredentialsInput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCreatePayload {
    pub customer_access_token: Option<CustomerAccessToken>,
    #[serde(default)]
    pub customer_user_errors: Vec<CustomerUserError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCreateData {
    pub customer_access_token_create: Option<TokenCreatePayload>,
}

graphql_operation!(
    CustomerAccessTokenCreate,
    r"
mutation CustomerAccessTokenCreate($input: CustomerAccessTokenCreateInput!) {
  customerAccessTokenCreate(input: $input) {
    customerAccessToken { accessToken expiresAt }
    customerUserErrors { code message }
  }
}
",
    TokenCreateVariables,
    TokenCreateData
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDeleteVariables {
    pub customer_access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDeletePayload {
    pub deleted_access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDeleteData {
    pub customer_access_token_delete: Option<TokenDeletePayload>,
}

graphql_operation!(
    CustomerAccessTokenDelete,
    r"
mutation CustomerAccessTokenDelete($customerAccessToken: String!) {
  customerAccessTokenDelete(customerAccessToken: $customerAccessToken) {
    deletedAccessToken
  }
}
",
    TokenDeleteVariables,
    TokenDeleteData
);

#[derive(Debug, Clone, Serialize)]
pub struct CustomerCreateVariables {
    pub input: CustomerCreateInput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreatePayload {
    pub customer: Option<Customer>,
    #[serde(default)]
    pub customer_user_errors: Vec<CustomerUserError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreateData {
    pub customer_create: Option<CustomerCreatePayload>,
}

graphql_operation!(
    CustomerCreate,
    r"
mutation CustomerCreate($input: CustomerCreateInput!) {
  customerCreate(input: $input) {
    customer { id email firstName lastName phone }
    customerUserErrors { code message }
  }
}
",
    CustomerCreateVariables,
    CustomerCreateData
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerVariables {
    pub customer_access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerData {
    pub customer: Option<Customer>,
}

graphql_operation!(
    GetCustomer,
    r"
query GetCustomer($customerAccessToken: String!) {
  customer(customerAccessToken: $customerAccessToken) {
    id
    email
    firstName
    lastName
    phone
  }
}
",
    CustomerVariables,
    CustomerData
);
