//! Route definitions for the `/transcribe` resource.
//!
//! Both endpoints require authentication.

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::transcribe;
use crate::state::AppState;

/// Routes mounted at `/transcribe`.
///
/// ```text
/// POST   /           -> submit_job    (JSON body, audio fetched from a URL)
/// POST   /upload     -> upload_job    (multipart body, audio file inline)
/// ```
///
/// The upload route carries its own body limit so the framework default
/// does not cap audio files below the configured maximum.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(transcribe::submit_job))
        .route(
            "/upload",
            post(transcribe::upload_job).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}
