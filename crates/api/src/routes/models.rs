use axum::routing::get;
use axum::{Json, Router};
use hark_engine::catalog::{ModelInfo, MODELS};

use crate::response::DataResponse;
use crate::state::AppState;

/// GET /models -- the engine/model combinations this deployment advertises.
///
/// Static catalog data, so no authentication is required.
async fn list_models() -> Json<DataResponse<Vec<ModelInfo>>> {
    Json(DataResponse {
        data: MODELS.to_vec(),
    })
}

/// Routes mounted at `/models`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_models))
}
