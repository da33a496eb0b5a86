//! Domain primitives for the hark transcription service.
//!
//! This crate holds the pieces every other layer builds on:
//!
//! - [`lifecycle`] — the job status state machine.
//! - [`retry`] — retry policies and the decisions they produce.
//! - [`signing`] — HMAC signatures for outbound webhooks.
//! - [`api_keys`] — API key generation and hashing.
//! - [`metric_names`] — canonical Prometheus metric names.
//!
//! It has zero internal dependencies so the database, engine and HTTP
//! layers can all share it without pulling in each other.

pub mod api_keys;
pub mod error;
pub mod lifecycle;
pub mod metric_names;
pub mod retry;
pub mod signing;
pub mod types;

pub use error::CoreError;
pub use types::{ExecutionToken, JobId, Timestamp};
