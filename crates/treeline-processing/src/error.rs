//! Error types for the feature preprocessing pipeline.
//!
//! Errors serialize as `{code, message}` so the HTTP layer can forward them
//! to clients without losing the machine-readable code.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for the preprocessing pipeline.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// One or more declared feature columns are absent from the frame.
    #[error("Declared feature columns missing from dataset: {}", .0.join(", "))]
    MissingFeatures(Vec<String>),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// Type conversion failed.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// Nothing left to fit on.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// `transform` or `export_metadata` called before `fit`.
    #[error("Pipeline has not been fitted")]
    NotFitted,

    /// Input file format could not be determined or is not supported.
    #[error("Unsupported data format: {0}")]
    UnsupportedFormat(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for client handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::MissingFeatures(_) => "MISSING_FEATURES",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::EmptyDataset(_) => "EMPTY_DATASET",
            Self::NotFitted => "NOT_FITTED",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the caller's input rather than by
    /// the pipeline itself.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_)
            | Self::MissingFeatures(_)
            | Self::InvalidConfig(_)
            | Self::UnsupportedFormat(_) => true,
            Self::WithContext { source, .. } => source.is_user_error(),
            _ => false,
        }
    }
}

impl From<ConfigValidationError> for PreprocessingError {
    fn from(err: ConfigValidationError) -> Self {
        PreprocessingError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(PreprocessingError::NotFitted.error_code(), "NOT_FITTED");
        assert_eq!(
            PreprocessingError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_missing_features_message_lists_columns() {
        let error = PreprocessingError::MissingFeatures(vec!["age".into(), "city".into()]);
        assert_eq!(
            error.to_string(),
            "Declared feature columns missing from dataset: age, city"
        );
        assert!(error.is_user_error());
    }

    #[test]
    fn test_is_user_error() {
        assert!(PreprocessingError::InvalidConfig("bad".into()).is_user_error());
        assert!(!PreprocessingError::NotFitted.is_user_error());
        assert!(!PreprocessingError::NoValidValues("x".into()).is_user_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = PreprocessingError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error =
            PreprocessingError::ColumnNotFound("test".to_string()).with_context("During fit");
        assert!(error.to_string().contains("During fit"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_config_validation_error_converts() {
        let error: PreprocessingError = ConfigValidationError::EmptyFeatures.into();
        assert_eq!(error.error_code(), "INVALID_CONFIG");
    }
}
