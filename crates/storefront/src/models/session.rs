//! Session-related types.
//!
//! The browser session holds the visitor's cart; everything else about the
//! visitor lives in cookies or upstream services.

/// Session keys.
pub mod keys {
    /// Key for the serialized `CartStore`.
    pub const CART: &str = "cart";
}
