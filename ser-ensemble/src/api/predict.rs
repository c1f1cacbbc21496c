//! POST /api/predict

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::ensemble::EnsembleResult;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Multipart field carrying the recording
pub const FILE_FIELD: &str = "file";

pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/api/predict", post(predict))
}

/// Uploaded file as received
#[derive(Debug)]
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Classify an uploaded WAV file.
///
/// 400 for a missing, unnamed or non-`.wav` upload; 500 with the failure's
/// description if decoding or inference fails.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<EnsembleResult>> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!(%rejection, "Request is not multipart");
        ApiError::Validation("No file provided")
    })?;

    let upload = read_upload(&mut multipart, state.config.max_upload_bytes)
        .await?
        .ok_or(ApiError::Validation("No file provided"))?;

    if upload.filename.is_empty() {
        return Err(ApiError::Validation("No file selected"));
    }
    if !upload.filename.ends_with(".wav") {
        return Err(ApiError::Validation("Only WAV files are supported"));
    }

    info!(filename = %upload.filename, bytes = upload.bytes.len(), "Received upload");

    let pipeline = state.pipeline.clone();
    let upload_dir = state.config.upload_dir.clone();

    // The staged file lives inside the blocking task, so it is removed when
    // the task finishes whatever the outcome.
    let task = tokio::task::spawn_blocking(move || -> ApiResult<EnsembleResult> {
        let staged = stage_upload(&upload.bytes, upload_dir.as_deref())?;
        Ok(pipeline.predict_file(staged.path())?)
    });

    let timeout_secs = state.config.inference_timeout_secs;
    let outcome = match tokio::time::timeout(Duration::from_secs(timeout_secs), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ApiError::Internal(format!(
            "Prediction task failed: {}",
            join_error
        ))),
        Err(_) => Err(ApiError::Timeout(timeout_secs)),
    };

    match outcome {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            *state.last_error.write().await = Some(e.to_string());
            Err(e)
        }
    }
}

/// First `file` field that carries a filename, if any.
async fn read_upload(multipart: &mut Multipart, limit: usize) -> ApiResult<Option<Upload>> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, limit))?;

        let Some(field) = field else {
            return Ok(None);
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // a plain form value named `file` is not an upload
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        return Ok(Some(Upload {
            filename,
            bytes: bytes.to_vec(),
        }));
    }
}

fn multipart_error(error: MultipartError, limit: usize) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge(limit)
    } else {
        debug!(error = %error, "Malformed multipart body");
        ApiError::Validation("No file provided")
    }
}

/// Write the upload to a uniquely named `.wav` temp file.
fn stage_upload(bytes: &[u8], upload_dir: Option<&Path>) -> ApiResult<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("upload-").suffix(".wav");

    let mut file = match upload_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            builder.tempfile_in(dir)?
        }
        None => builder.tempfile()?,
    };

    file.write_all(bytes)?;
    file.flush()?;
    debug!(path = %file.path().display(), "Staged upload");
    Ok(file)
}
