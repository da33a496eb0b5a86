//! API key model for caller authentication and admission control.

use hark_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `api_keys` table.
///
/// **Note:** `key_hash` is never serialized to responses. The `key_prefix`
/// field is used for human-readable identification. The `window_*` columns
/// implement the fixed rate limit window; they are only ever touched by the
/// atomic admission update, so concurrent instances sharing the table agree
/// on the count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApiKey {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub key_prefix: String,
    pub is_active: bool,
    /// Requests admitted per window.
    pub rate_limit: i32,
    /// Window length in seconds.
    pub rate_limit_period_secs: i32,
    pub window_started_at: Timestamp,
    pub window_count: i32,
    pub last_used_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO for provisioning a new API key.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub name: String,
    /// SHA-256 hex digest of the plaintext key.
    pub key_hash: String,
    pub key_prefix: String,
    pub rate_limit: i32,
    pub rate_limit_period_secs: i32,
}
