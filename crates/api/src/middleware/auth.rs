//! API-key authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hark_core::api_keys::hash_api_key;
use hark_core::error::CoreError;
use hark_db::models::api_key::ApiKey;
use hark_db::repositories::ApiKeyRepo;

use crate::error::AppError;
use crate::state::AppState;

/// Header callers present their API key in.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authenticated API key extracted from the `X-API-Key` header.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(key: AuthedKey) -> AppResult<Json<()>> {
///     tracing::info!(key = %key.0.key_prefix, "handling request");
///     Ok(Json(()))
/// }
/// ```
///
/// Extraction hashes the presented key, looks it up among active keys, and
/// admits the request under the key's rate limit window. Rejections map to
/// 401 (missing or unknown key) or 429 (window exhausted), so the caller is
/// turned away before any job row exists.
#[derive(Debug, Clone)]
pub struct AuthedKey(pub ApiKey);

impl FromRequestParts<AppState> for AuthedKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing X-API-Key header".into()))
            })?;

        // Only the hash ever touches the database or the logs.
        let key_hash = hash_api_key(presented);
        let key = ApiKeyRepo::find_by_hash(&state.pool, &key_hash)
            .await?
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid API key".into())))?;

        let admitted = ApiKeyRepo::try_admit(&state.pool, key.id).await?;
        if !admitted {
            return Err(AppError::Core(CoreError::RateLimited(format!(
                "Rate limit exceeded: {} requests per {} seconds",
                key.rate_limit, key.rate_limit_period_secs
            ))));
        }

        // Usage bookkeeping must not fail the request.
        if let Err(e) = ApiKeyRepo::touch_last_used(&state.pool, key.id).await {
            tracing::warn!(key = %key.key_prefix, error = %e, "Failed to update key last_used_at");
        }

        Ok(AuthedKey(key))
    }
}
