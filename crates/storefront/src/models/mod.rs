//! Domain models for storefront.

pub mod profile;
pub mod session;

pub use profile::{ContactSubmission, NewContactSubmission, Profile, ProfileUpdate};
pub use session::keys;
