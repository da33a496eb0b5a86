//! Authentication middleware extractors.
//!
//! - [`auth::AuthedKey`] -- Extracts and admits the API key from the `X-API-Key` header.

pub mod auth;
