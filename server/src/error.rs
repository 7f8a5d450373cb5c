//! HTTP error responses.
//!
//! Every failure is answered with a JSON body `{"code": ..., "message": ...}`.
//! Errors caused by the request itself map to `400 Bad Request`, everything
//! else to `500 Internal Server Error`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::{error, warn};
use treeline_learning::TrainingError;
use treeline_processing::PreprocessingError;

/// Errors returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The multipart body is malformed or a required part is absent.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The request body exceeds the configured upload limit.
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    /// The uploaded file could not be parsed into a frame.
    #[error("Could not read uploaded file: {0}")]
    InvalidUpload(#[source] PreprocessingError),

    /// Configuration, data or training failure.
    #[error(transparent)]
    Training(#[from] TrainingError),

    /// The blocking training task panicked or was aborted.
    #[error("Training task failed: {0}")]
    TaskFailed(String),
}

impl ApiError {
    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::InvalidUpload(_) => "INVALID_UPLOAD",
            Self::Training(e) => e.error_code(),
            Self::TaskFailed(_) => "TASK_FAILED",
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Training(e) if e.is_user_error() => StatusCode::BAD_REQUEST,
            Self::Training(_) | Self::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PreprocessingError> for ApiError {
    fn from(err: PreprocessingError) -> Self {
        Self::Training(TrainingError::Preprocessing(err))
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ApiError", 2)?;
        state.serialize_field("code", self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed [{}]: {}", self.error_code(), self);
        } else {
            warn!("Request rejected [{}]: {}", self.error_code(), self);
        }
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_map_to_bad_request() {
        let err = ApiError::from(TrainingError::TargetNotFound("label".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "TARGET_NOT_FOUND");

        let err = ApiError::BadRequest("missing 'file' part".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_map_to_server_error() {
        let err = ApiError::from(TrainingError::TrainingFailed("boom".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::TaskFailed("panicked".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_features_is_user_error() {
        let err = ApiError::from(PreprocessingError::MissingFeatures(vec!["age".to_string()]));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "MISSING_FEATURES");
    }

    #[test]
    fn test_serializes_code_and_message() {
        let err = ApiError::InvalidUpload(PreprocessingError::EmptyDataset("empty".to_string()));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INVALID_UPLOAD");
        assert!(json["message"].as_str().unwrap().contains("empty"));
    }
}
