pub mod health;
pub mod jobs;
pub mod metrics;
pub mod models;
pub mod transcribe;
pub mod webhook;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /transcribe               submit job, audio by URL (POST)
/// /transcribe/upload        submit job, audio uploaded inline (POST, multipart)
///
/// /jobs/{id}                job status (GET)
/// /jobs/{id}                cancel job (DELETE)
///
/// /models                   advertised engine/model catalog (GET)
///
/// /webhook/test             send a signed test payload (POST)
/// ```
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // Job submission (URL and multipart upload).
        .nest("/transcribe", transcribe::router(max_upload_bytes))
        // Job status and cancellation.
        .nest("/jobs", jobs::router())
        // Advertised engine/model catalog.
        .nest("/models", models::router())
        // Webhook configuration testing.
        .nest("/webhook", webhook::router())
}
