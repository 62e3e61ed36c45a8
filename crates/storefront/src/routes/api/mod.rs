//! JSON API for identity-bearing clients.
//!
//! Every endpoint here requires `Authorization: Bearer <id token>`.

pub mod invoices;
pub mod users;
