//! Route definitions for the `/jobs` resource.
//!
//! All endpoints require authentication.

use axum::routing::get;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /{id}     -> get_job
/// DELETE /{id}     -> cancel_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(jobs::get_job).delete(jobs::cancel_job))
}
