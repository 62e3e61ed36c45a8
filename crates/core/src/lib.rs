//! Meadowlark Core - Shared types and client-state logic.
//!
//! This crate provides the pieces of the storefront that have no I/O:
//! - `storefront` - Public-facing site (axum binary)
//! - `cli` - Command-line tools for migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no
//! database access, no HTTP clients. The storefront owns one [`CartStore`]
//! per browser session and asks the [`AccountGate`] what to do for every
//! account page request.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and phone numbers
//! - [`cart`] - The cart store (line items + drawer visibility)
//! - [`gate`] - Account route gating and breadcrumbs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod gate;
pub mod types;

pub use cart::{CartLine, CartStore, NewCartLine};
pub use gate::{AccountGate, AuthState, Breadcrumb, GateDecision, GateObserver, GateStep};
pub use types::*;
