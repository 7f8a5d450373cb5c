//! Common types used throughout the treeline-learning crate.
//!
//! This module defines the result types and metrics returned by the trainer
//! and the model.
//!
//! # Overview
//!
//! - [`TrainingResult`]: Complete result from [`Trainer::train()`](crate::Trainer::train)
//! - [`Metrics`]: Evaluation metrics (classification or regression)
//! - [`Artifacts`]: The serialized model and an optional generated client
//! - [`ModelInfo`]: Metadata about a trained model
//!
//! # Example
//!
//! ```ignore
//! let result = Trainer::new(config)?.train(&df)?;
//!
//! match &result.metrics {
//!     Metrics::Classification(m) => println!("Test accuracy: {:.3}", m.test_accuracy),
//!     Metrics::Regression(m) => println!("Test RMSE: {:.3}", m.test_rmse),
//! }
//!
//! // The model travels as base64 JSON
//! let bytes = BASE64_STANDARD.decode(&result.artifacts.model.data)?;
//! let model = TrainedModel::from_bytes(&bytes)?;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use treeline_processing::PipelineMetadata;

use crate::config::{BoostingParams, TaskType};

/// Value of [`TrainingResult::status`] for a completed run.
pub const STATUS_SUCCESS: &str = "success";

/// Format tag of the model artifact.
pub const MODEL_FORMAT_JSON: &str = "json";

/// Result of a training run.
///
/// Returned by [`Trainer::train()`](crate::Trainer::train). Failed runs return an
/// error instead, so a result always describes a trained model.
///
/// # Fields
///
/// - `status`: Always `"success"`
/// - `task_type`: The task the model was trained for
/// - `metrics`: Train and test metrics for the task type
/// - `feature_importance`: Importances normalised into `[0, 1]`, aligned with `feature_names`
/// - `feature_names`: Model input columns in matrix order
/// - `class_mapping`: Encoded class index to original label (`None` for regression)
/// - `artifacts`: Base64 model bytes and the optional client module
/// - `pipeline_metadata`: Everything needed to rebuild the preprocessing outside this process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Always [`STATUS_SUCCESS`].
    pub status: String,

    /// The task the model was trained for.
    pub task_type: TaskType,

    /// Metrics achieved on the train and test partitions.
    pub metrics: Metrics,

    /// Normalised importance per feature, in the order of `feature_names`.
    pub feature_importance: Vec<f64>,

    /// Names of the model input columns in matrix order.
    pub feature_names: Vec<String>,

    /// Encoded class index to original label.
    ///
    /// Serialized as a JSON object keyed by the index (`{"0": "no", "1": "yes"}`),
    /// `null` for regression.
    pub class_mapping: Option<BTreeMap<usize, String>>,

    /// The serialized model and the optional generated client module.
    pub artifacts: Artifacts,

    /// Export of the fitted preprocessing pipeline.
    pub pipeline_metadata: PipelineMetadata,
}

/// Evaluation metrics, shaped by the task type.
///
/// Serialized untagged: regression results carry `train_rmse`/`test_rmse`,
/// classification results carry `train_accuracy`/`test_accuracy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metrics {
    /// Metrics for a regression model.
    Regression(RegressionMetrics),

    /// Metrics for a binary or multiclass model.
    Classification(ClassificationMetrics),
}

impl Metrics {
    /// Number of model input columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        match self {
            Metrics::Regression(m) => m.n_features,
            Metrics::Classification(m) => m.n_features,
        }
    }
}

/// Regression metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Root mean squared error on the training partition.
    pub train_rmse: f64,

    /// Root mean squared error on the test partition.
    pub test_rmse: f64,

    /// Number of model input columns.
    pub n_features: usize,

    /// Actual and predicted values on the test partition, row-aligned.
    pub test_predictions: TestPredictions,
}

/// Actual and predicted targets of the test partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPredictions {
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
}

/// Classification metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    /// Fraction of training rows predicted correctly, in `[0, 1]`.
    pub train_accuracy: f64,

    /// Fraction of test rows predicted correctly, in `[0, 1]`.
    pub test_accuracy: f64,

    /// Number of classes the target was encoded into.
    pub n_classes: usize,

    /// Number of model input columns.
    pub n_features: usize,

    /// Confusion matrix on the test partition.
    pub confusion_matrix: ConfusionMatrix,
}

/// A confusion matrix over the classes seen in the test partition.
///
/// `matrix[i][j]` counts rows whose actual class is `labels[i]` and whose
/// predicted class is `labels[j]`. Labels are the sorted union of the actual
/// and predicted classes, rendered through the class mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub matrix: Vec<Vec<usize>>,
}

/// Artifacts produced by a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    /// The serialized model.
    pub model: ModelArtifact,

    /// Generated client module source, when one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_module: Option<String>,
}

/// A serialized model, base64 encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Standard base64 of the model envelope bytes.
    pub data: String,

    /// Envelope format, always [`MODEL_FORMAT_JSON`].
    pub format: String,
}

/// Information about a trained model.
///
/// Returned by [`TrainedModel::info()`](crate::TrainedModel::info).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Version of the envelope the model was read from or will be written as.
    pub format_version: u32,

    /// The task the model was trained for.
    pub task_type: TaskType,

    /// Number of input columns the model expects.
    pub n_features: usize,

    /// Number of classes (`None` for regression).
    pub n_classes: Option<usize>,

    /// Names of the input columns in the order expected by the model.
    pub feature_names: Vec<String>,

    /// Class labels in index order (`None` for regression).
    pub class_labels: Option<Vec<String>>,

    /// Boosting hyperparameters used for training.
    pub parameters: BoostingParams,

    /// When training finished.
    pub trained_at: DateTime<Utc>,
}
