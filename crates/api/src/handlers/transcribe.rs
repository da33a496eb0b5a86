//! Handlers for the `/transcribe` resource.
//!
//! All endpoints require authentication via [`AuthedKey`]. Validation of
//! the submission itself (exactly one audio source, known engine, http(s)
//! URLs) lives in the orchestrator; these handlers own the transport
//! concerns: form decoding and upload storage.

use axum::body::Bytes;
use axum::extract::multipart::{Field, Multipart};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hark_engine::types::{audio_extension, is_supported_format, SUPPORTED_AUDIO_FORMATS};
use hark_jobs::SubmitRequest;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::jobs::JobStatusResponse;
use crate::middleware::auth::AuthedKey;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Submit (URL)
// ---------------------------------------------------------------------------

/// POST /api/v1/transcribe
///
/// Submit a transcription job for audio fetched from a URL. Returns 201
/// with the created job; transcription happens asynchronously and the
/// caller polls `/jobs/{id}` or listens on its webhook.
pub async fn submit_job(
    auth: AuthedKey,
    State(state): State<AppState>,
    Json(mut input): Json<SubmitRequest>,
) -> AppResult<impl IntoResponse> {
    input.api_key_id = Some(auth.0.id);

    let job = state.orchestrator.submit(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: JobStatusResponse::from(job),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Submit (file upload)
// ---------------------------------------------------------------------------

/// POST /api/v1/transcribe/upload
///
/// Submit a transcription job with the audio file inline as multipart form
/// data. The file lands under the configured upload directory with a
/// generated name; the remaining form fields mirror the JSON submission.
pub async fn upload_job(
    auth: AuthedKey,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut request = SubmitRequest::default();
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::BadRequest("File field needs a filename".into()))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
                file = Some((filename, data));
            }
            "engine" => request.engine = optional_text(field).await?,
            "model" => request.model = optional_text(field).await?,
            "language" => request.language = optional_text(field).await?,
            "diarize" => {
                if let Some(text) = optional_text(field).await? {
                    request.diarize = parse_bool("diarize", &text)?;
                }
            }
            "word_timestamps" => {
                if let Some(text) = optional_text(field).await? {
                    request.word_timestamps = parse_bool("word_timestamps", &text)?;
                }
            }
            "webhook_url" => request.webhook_url = optional_text(field).await?,
            "correlation_id" => request.correlation_id = optional_text(field).await?,
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::BadRequest("Missing file field in multipart body".into()))?;

    if data.len() > state.config.max_upload_bytes {
        return Err(AppError::BadRequest(format!(
            "Audio file exceeds the {} byte upload limit",
            state.config.max_upload_bytes
        )));
    }

    let extension = audio_extension(&filename)
        .filter(|ext| is_supported_format(ext))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unsupported audio format. Supported: {}",
                SUPPORTED_AUDIO_FORMATS.join(", ")
            ))
        })?;

    // Uploads get generated names so hostile filenames never reach the
    // filesystem; the original name survives on the job row.
    let stored = state
        .config
        .upload_dir
        .join(format!("{}.{extension}", Uuid::new_v4()));

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload directory: {e}")))?;
    tokio::fs::write(&stored, &data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

    request.url = None;
    request.audio_path = Some(stored.to_string_lossy().into_owned());
    request.filename = Some(filename);
    request.api_key_id = Some(auth.0.id);

    let job = state.orchestrator.submit(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: JobStatusResponse::from(job),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Form field helpers
// ---------------------------------------------------------------------------

/// Read a multipart field as text, mapping empty values to `None`.
async fn optional_text(field: Field<'_>) -> Result<Option<String>, AppError> {
    let text = field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form field: {e}")))?;
    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Parse a form boolean (`true`/`false`, `1`/`0`, `yes`/`no`).
fn parse_bool(field: &str, value: &str) -> Result<bool, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(AppError::BadRequest(format!(
            "Field '{field}' must be a boolean, got '{other}'"
        ))),
    }
}
