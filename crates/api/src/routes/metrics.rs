use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// GET /metrics -- Prometheus text exposition from the installed recorder.
async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// Mount the metrics route (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(render_metrics))
}
