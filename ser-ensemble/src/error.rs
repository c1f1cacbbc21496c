//! Error types for ser-ensemble
//!
//! `PipelineError` covers everything that can go wrong between a file path and
//! an ensemble verdict. `ApiError` is the HTTP-facing wrapper that decides the
//! status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of the extraction / inference / aggregation pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// File is unreadable or not valid audio
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// Numeric feature computation failed
    #[error("Feature extraction failed: {0}")]
    Feature(String),

    /// Model input shape not supported by this implementation
    #[error("Shape error: {0}")]
    Shape(String),

    /// Underlying model invocation failed or was given a mismatched tensor
    #[error("Inference error: {0}")]
    Inference(String),

    /// A native label is not part of the unified label space
    #[error("Unknown emotion label: '{0}'")]
    UnknownLabel(String),

    /// Model artifact could not be loaded
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload rejected before any processing (400)
    #[error("{0}")]
    Validation(&'static str),

    /// Upload larger than the configured body limit (413)
    #[error("Upload exceeds the {0} byte limit")]
    TooLarge(usize),

    /// Extraction or inference failure (500)
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// IO error while staging the upload (500)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Prediction exceeded the configured budget (500)
    #[error("Prediction timed out after {0}s")]
    Timeout(u64),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Pipeline(_)
            | ApiError::Io(_)
            | ApiError::Timeout(_)
            | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
