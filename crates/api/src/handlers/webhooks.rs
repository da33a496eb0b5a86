//! Handlers for the `/webhook` resource.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthedKey;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for the webhook test endpoint.
#[derive(Debug, Deserialize)]
pub struct WebhookTestRequest {
    /// Endpoint the test payload is sent to.
    pub url: String,
}

/// Outcome of a webhook test delivery.
#[derive(Debug, Serialize)]
pub struct WebhookTestResponse {
    /// Whether the endpoint accepted the payload.
    pub success: bool,
    /// Delivery error, when the endpoint rejected the payload or could not
    /// be reached after all retries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/v1/webhook/test
///
/// Send a signed test payload to the given URL through the production
/// delivery path (same signing, same retry schedule), so receivers can
/// verify their endpoint and signature handling before submitting real
/// jobs. Delivery failure is reported in the body, not as an HTTP error:
/// the test itself succeeded.
pub async fn test_webhook(
    _auth: AuthedKey,
    State(state): State<AppState>,
    Json(input): Json<WebhookTestRequest>,
) -> AppResult<impl IntoResponse> {
    if !(input.url.starts_with("http://") || input.url.starts_with("https://")) {
        return Err(AppError::BadRequest("Webhook URL must be http(s)".into()));
    }

    let payload = serde_json::json!({
        "correlation_id": format!("test-{}", Uuid::new_v4()),
        "status": "test",
        "message": "This is a test webhook",
    })
    .to_string();

    let data = match state.notifier.deliver_payload(&input.url, payload).await {
        Ok(()) => WebhookTestResponse {
            success: true,
            error: None,
        },
        Err(e) => WebhookTestResponse {
            success: false,
            error: Some(e.to_string()),
        },
    };

    Ok(Json(DataResponse { data }))
}
