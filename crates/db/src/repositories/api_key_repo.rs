//! Repository for the `api_keys` table.
//!
//! Admission control lives here as a single conditional UPDATE on the key's
//! window columns, so any number of service instances sharing the table get
//! one consistent request count per window.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::api_key::{ApiKey, NewApiKey};

const COLUMNS: &str = "\
    id, name, key_hash, key_prefix, is_active, rate_limit, rate_limit_period_secs, \
    window_started_at, window_count, last_used_at, created_at, updated_at";

/// Provides lookups and admission control for API keys.
pub struct ApiKeyRepo;

impl ApiKeyRepo {
    /// Create a new API key. Returns the full row (with hash).
    pub async fn create(pool: &PgPool, input: &NewApiKey) -> Result<ApiKey, sqlx::Error> {
        let query = format!(
            "INSERT INTO api_keys \
                (name, key_hash, key_prefix, rate_limit, rate_limit_period_secs) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApiKey>(&query)
            .bind(&input.name)
            .bind(&input.key_hash)
            .bind(&input.key_prefix)
            .bind(input.rate_limit)
            .bind(input.rate_limit_period_secs)
            .fetch_one(pool)
            .await
    }

    /// Find an active API key by the SHA-256 hash of its plaintext.
    pub async fn find_by_hash(
        pool: &PgPool,
        key_hash: &str,
    ) -> Result<Option<ApiKey>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM api_keys WHERE key_hash = $1 AND is_active");
        sqlx::query_as::<_, ApiKey>(&query)
            .bind(key_hash)
            .fetch_optional(pool)
            .await
    }

    /// Record that a key was used for a successfully authenticated request.
    pub async fn touch_last_used(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Try to admit one request under the key's fixed rate limit window.
    ///
    /// A single conditional UPDATE either rolls the window over (when the
    /// period elapsed) or bumps the in-window count (when below the limit).
    /// Zero rows affected means the window is full and the request must be
    /// rejected. All SET expressions read the pre-update row, and concurrent
    /// updates serialize on the row lock, so the count never overshoots.
    pub async fn try_admit(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE api_keys \
             SET window_count = CASE \
                     WHEN NOW() - window_started_at >= rate_limit_period_secs * INTERVAL '1 second' \
                         THEN 1 \
                     ELSE window_count + 1 \
                 END, \
                 window_started_at = CASE \
                     WHEN NOW() - window_started_at >= rate_limit_period_secs * INTERVAL '1 second' \
                         THEN NOW() \
                     ELSE window_started_at \
                 END, \
                 updated_at = NOW() \
             WHERE id = $1 AND is_active \
               AND (window_count < rate_limit \
                    OR NOW() - window_started_at >= rate_limit_period_secs * INTERVAL '1 second')",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }
}
