//! Request handlers for the HTTP API.
//!
//! Route wiring lives in [`crate::routes`]; handlers hold the logic.

pub mod jobs;
pub mod transcribe;
pub mod webhooks;
