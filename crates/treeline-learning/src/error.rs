//! Error types for the treeline-learning crate.
//!
//! This module defines [`TrainingError`], the single error type returned by
//! the training orchestrator, the boosting backend and [`TrainedModel`].
//!
//! # Error Handling
//!
//! Errors are designed to be:
//! - **Descriptive**: Each variant carries the message of whatever failed
//! - **Classified**: [`TrainingError::is_user_error`] separates bad requests
//!   from internal failures
//! - **Serializable**: every error renders as `{code, message}`
//!
//! # Example
//!
//! ```
//! use treeline_learning::{TaskType, TrainConfig, TrainingError};
//!
//! fn configure() -> Result<TrainConfig, TrainingError> {
//!     // Errors are automatically propagated with ?
//!     let config = TrainConfig::builder()
//!         .target_column("label")
//!         .task_type(TaskType::BinaryClassification)
//!         .build()?;
//!     Ok(config)
//! }
//! # configure().unwrap();
//! ```
//!
//! [`TrainedModel`]: crate::TrainedModel

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;
use treeline_processing::PreprocessingError;

/// The main error type for treeline-learning operations.
///
/// This enum covers all error conditions that can occur during:
/// - Training configuration and validation
/// - Target encoding and train/test splitting
/// - Model fitting and evaluation
/// - Model serialization and inference
///
/// # Classification
///
/// Errors caused by the request itself (a missing target column, an invalid
/// configuration, declared features absent from the data, a target that does
/// not fit the task type) report `true` from
/// [`is_user_error`](Self::is_user_error). Everything else is an internal
/// failure.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TrainingError {
    /// Invalid training configuration.
    ///
    /// Check the error message for details on which configuration value is invalid
    /// and what values are accepted.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The specified target column was not found in the DataFrame.
    ///
    /// Ensure the `target_column` in your config matches a column name in the DataFrame.
    /// Column names are case-sensitive.
    #[error("Target column '{0}' not found")]
    TargetNotFound(String),

    /// The target column cannot be used for the requested task type.
    ///
    /// Common causes:
    /// - Binary classification on a target with more than two classes
    /// - A numeric binary target with values other than 0 and 1
    /// - Regression on a non-numeric target
    /// - Classification on a target with a single class
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// The data cannot be trained on.
    ///
    /// Common causes:
    /// - Too few rows to give both the train and test partition a row
    /// - Every row was removed by null-target or missing-value handling
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The preprocessing pipeline failed.
    ///
    /// User-facing causes (missing declared features, invalid pipeline
    /// configuration) keep their classification.
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    /// The boosting library failed while fitting.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// The specified model file was not found.
    #[error("Model not found: {path}")]
    ModelNotFound {
        /// The path that was not found.
        path: String,
    },

    /// An error occurred during inference/prediction.
    ///
    /// Common causes:
    /// - Input width does not match the model's feature count
    /// - `predict_proba` called on a regression model
    #[error("Inference error: {0}")]
    InferenceError(String),

    /// A model artifact could not be written or read back.
    ///
    /// Raised for unknown envelope versions and for booster payloads the
    /// boosting library rejects.
    #[error("Model serialization failed: {0}")]
    Serialization(String),

    /// Polars error while slicing the raw frame.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during file operations.
    ///
    /// This wraps standard I/O errors that occur during model save/load operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrainingError {
    /// Machine-readable error code.
    ///
    /// Preprocessing errors report their own code.
    ///
    /// ```
    /// use treeline_learning::TrainingError;
    ///
    /// let err = TrainingError::TargetNotFound("label".into());
    /// assert_eq!(err.error_code(), "TARGET_NOT_FOUND");
    /// ```
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::TargetNotFound(_) => "TARGET_NOT_FOUND",
            Self::InvalidTarget(_) => "INVALID_TARGET",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::Preprocessing(err) => err.error_code(),
            Self::TrainingFailed(_) => "TRAINING_FAILED",
            Self::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            Self::InferenceError(_) => "INFERENCE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_FAILED",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Whether the request itself is at fault rather than the service.
    ///
    /// The HTTP layer maps `true` to 400 and `false` to 500.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::InvalidConfig(_)
            | Self::TargetNotFound(_)
            | Self::InvalidTarget(_)
            | Self::InvalidData(_) => true,
            Self::Preprocessing(err) => err.is_user_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for TrainingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("TrainingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for training operations.
pub type Result<T> = std::result::Result<T, TrainingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TrainingError::InvalidConfig("x".into()).error_code(),
            "INVALID_CONFIG"
        );
        assert_eq!(
            TrainingError::ModelNotFound {
                path: "m.json".into()
            }
            .error_code(),
            "MODEL_NOT_FOUND"
        );
    }

    #[test]
    fn test_preprocessing_error_keeps_code_and_class() {
        let err: TrainingError = PreprocessingError::MissingFeatures(vec!["age".into()]).into();
        assert_eq!(err.error_code(), "MISSING_FEATURES");
        assert!(err.is_user_error());

        let err: TrainingError = PreprocessingError::NotFitted.into();
        assert_eq!(err.error_code(), "NOT_FITTED");
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_user_error_classification() {
        assert!(TrainingError::TargetNotFound("y".into()).is_user_error());
        assert!(TrainingError::InvalidTarget("three classes".into()).is_user_error());
        assert!(!TrainingError::TrainingFailed("boom".into()).is_user_error());
        assert!(!TrainingError::Serialization("bad".into()).is_user_error());
    }

    #[test]
    fn test_error_display() {
        let err = TrainingError::TargetNotFound("price".into());
        assert_eq!(err.to_string(), "Target column 'price' not found");
    }

    #[test]
    fn test_error_serialization() {
        let err = TrainingError::InvalidTarget("binary target has 3 classes".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INVALID_TARGET");
        assert_eq!(
            json["message"],
            "Invalid target: binary target has 3 classes"
        );
    }
}
