//! Route definitions for the `/webhook` resource.
//!
//! All endpoints require authentication.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Routes mounted at `/webhook`.
///
/// ```text
/// POST   /test     -> test_webhook
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/test", post(webhooks::test_webhook))
}
