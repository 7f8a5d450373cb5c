//! Configuration types for a training run.
//!
//! This module provides [`TrainConfig`] and its builder, the boosting
//! hyperparameters in [`BoostingParams`], and the [`TaskType`] enum.
//!
//! # Example
//!
//! ```
//! use treeline_learning::{TaskType, TrainConfig};
//!
//! let config = TrainConfig::builder()
//!     .target_column("churned")
//!     .task_type(TaskType::BinaryClassification)
//!     .max_depth(4)
//!     .n_estimators(50)
//!     .random_seed(7)
//!     .build()
//!     .expect("valid config");
//! ```
//!
//! The same configuration arrives over HTTP as JSON:
//!
//! ```
//! use treeline_learning::TrainConfig;
//!
//! let config = TrainConfig::from_json(
//!     r#"{"target_column": "price", "task_type": "regression"}"#,
//! ).expect("valid config");
//! assert_eq!(config.parameters.n_estimators, 100);
//! ```

use serde::{Deserialize, Serialize};
use treeline_processing::{DataPipelineConfig, PreprocessingOptions};

use crate::error::TrainingError;

/// The kind of model to train.
///
/// This determines the boosting objective, how the target is encoded and
/// which metrics are reported:
/// - [`BinaryClassification`](Self::BinaryClassification): logistic loss, accuracy
/// - [`MulticlassClassification`](Self::MulticlassClassification): one-vs-rest
///   logistic boosters with normalised probabilities, accuracy
/// - [`Regression`](Self::Regression): squared error, RMSE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Two classes. String targets are label encoded; numeric targets must be 0/1.
    BinaryClassification,

    /// Any number of classes, always label encoded.
    MulticlassClassification,

    /// Continuous numeric target, used as-is.
    Regression,
}

impl TaskType {
    /// Returns the wire name of the task type.
    ///
    /// # Examples
    ///
    /// ```
    /// use treeline_learning::TaskType;
    ///
    /// assert_eq!(TaskType::BinaryClassification.as_str(), "binary_classification");
    /// assert_eq!(TaskType::Regression.as_str(), "regression");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::BinaryClassification => "binary_classification",
            TaskType::MulticlassClassification => "multiclass_classification",
            TaskType::Regression => "regression",
        }
    }

    /// Whether the task predicts classes.
    #[must_use]
    pub fn is_classification(&self) -> bool {
        !matches!(self, TaskType::Regression)
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_max_depth() -> u32 {
    3
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_n_estimators() -> u32 {
    100
}

fn default_test_size() -> f64 {
    0.2
}

/// Hyperparameters handed to the boosting library.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Maximum depth of each tree, in `[1, 10]` (default: 3).
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Shrinkage applied to every tree, in `(0, 1]` (default: 0.1).
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Number of boosting rounds, in `[1, 1000]` (default: 100).
    #[serde(default = "default_n_estimators")]
    pub n_estimators: u32,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            learning_rate: default_learning_rate(),
            n_estimators: default_n_estimators(),
        }
    }
}

impl BoostingParams {
    /// Check every hyperparameter against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] naming the first value out of range.
    pub fn validate(&self) -> Result<(), TrainingError> {
        if !(1..=10).contains(&self.max_depth) {
            return Err(TrainingError::InvalidConfig(format!(
                "max_depth must be between 1 and 10, got {}",
                self.max_depth
            )));
        }

        if !self.learning_rate.is_finite()
            || self.learning_rate <= 0.0
            || self.learning_rate > 1.0
        {
            return Err(TrainingError::InvalidConfig(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }

        if !(1..=1000).contains(&self.n_estimators) {
            return Err(TrainingError::InvalidConfig(format!(
                "n_estimators must be between 1 and 1000, got {}",
                self.n_estimators
            )));
        }

        Ok(())
    }
}

/// Configuration for one training run.
///
/// Use [`TrainConfig::builder()`] in code, or [`TrainConfig::from_json`] for
/// configurations received from clients. Every field except `target_column`
/// and `task_type` has a default.
///
/// # Feature Roles
///
/// When [`pipeline`](Self::pipeline) is `None`, every non-target column is
/// assigned a role from its dtype and the pipeline is built with
/// [`preprocessing`](Self::preprocessing). An explicit pipeline configuration
/// bypasses role inference and carries its own strategies.
///
/// # Validation
///
/// [`validate()`](Self::validate) (run by [`build()`](TrainConfigBuilder::build),
/// [`from_json`](Self::from_json) and the trainer) checks:
/// - `target_column` is not empty
/// - every [`BoostingParams`] value is in range
/// - `test_size` is in `(0.0, 1.0)` (exclusive)
/// - an explicit pipeline is itself valid and does not list the target as a feature
/// - `preprocessing.outlier_threshold` is positive and finite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Name of the target column in the raw frame.
    pub target_column: String,

    /// What kind of model to train.
    pub task_type: TaskType,

    /// Boosting hyperparameters.
    #[serde(default)]
    pub parameters: BoostingParams,

    /// Fraction of rows held out for evaluation (default: 0.2).
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Seed for the train/test partition.
    ///
    /// `None` draws a fresh seed from the operating system, so repeated runs
    /// see different partitions.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Explicit feature pipeline; `None` infers roles from dtypes.
    #[serde(default)]
    pub pipeline: Option<DataPipelineConfig>,

    /// Strategies applied to inferred feature roles.
    #[serde(default)]
    pub preprocessing: PreprocessingOptions,
}

impl TrainConfig {
    /// Create a new builder for `TrainConfig`.
    ///
    /// # Example
    ///
    /// ```
    /// use treeline_learning::{TaskType, TrainConfig};
    ///
    /// let config = TrainConfig::builder()
    ///     .target_column("species")
    ///     .task_type(TaskType::MulticlassClassification)
    ///     .build()
    ///     .expect("valid config");
    /// ```
    #[must_use]
    pub fn builder() -> TrainConfigBuilder {
        TrainConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] for malformed JSON, unknown
    /// task types, missing required fields and out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, TrainingError> {
        let config: TrainConfig = serde_json::from_str(json)
            .map_err(|e| TrainingError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration; see the type-level docs for the rules.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] describing the first violation.
    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.target_column.trim().is_empty() {
            return Err(TrainingError::InvalidConfig(
                "target_column must not be empty".to_string(),
            ));
        }

        self.parameters.validate()?;

        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(TrainingError::InvalidConfig(
                "test_size must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }

        if let Some(pipeline) = &self.pipeline {
            pipeline
                .validate()
                .map_err(|e| TrainingError::InvalidConfig(e.to_string()))?;

            if pipeline.features.iter().any(|f| f == &self.target_column) {
                return Err(TrainingError::InvalidConfig(format!(
                    "target column '{}' cannot also be a feature",
                    self.target_column
                )));
            }
        }

        let threshold = self.preprocessing.outlier_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(TrainingError::InvalidConfig(format!(
                "outlier_threshold must be a positive finite number, got {}",
                threshold
            )));
        }

        Ok(())
    }
}

/// Builder for [`TrainConfig`].
///
/// Created via [`TrainConfig::builder()`]. All setters return `self` to allow
/// method chaining. The task type defaults to binary classification.
///
/// # Example
///
/// ```
/// use treeline_learning::{BoostingParams, TaskType, TrainConfig};
///
/// let config = TrainConfig::builder()
///     .target_column("price")
///     .task_type(TaskType::Regression)
///     .parameters(BoostingParams { max_depth: 5, learning_rate: 0.05, n_estimators: 300 })
///     .test_size(0.25)
///     .build()
///     .expect("valid config");
/// ```
#[derive(Debug, Clone)]
pub struct TrainConfigBuilder {
    config: TrainConfig,
}

impl Default for TrainConfigBuilder {
    fn default() -> Self {
        Self {
            config: TrainConfig {
                target_column: String::new(),
                task_type: TaskType::BinaryClassification,
                parameters: BoostingParams::default(),
                test_size: default_test_size(),
                random_seed: None,
                pipeline: None,
                preprocessing: PreprocessingOptions::default(),
            },
        }
    }
}

impl TrainConfigBuilder {
    /// Set the target column name.
    #[must_use]
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.config.target_column = column.into();
        self
    }

    /// Set the task type.
    #[must_use]
    pub fn task_type(mut self, task_type: TaskType) -> Self {
        self.config.task_type = task_type;
        self
    }

    /// Replace all boosting hyperparameters at once.
    #[must_use]
    pub fn parameters(mut self, parameters: BoostingParams) -> Self {
        self.config.parameters = parameters;
        self
    }

    /// Set the maximum tree depth.
    ///
    /// Must be in `[1, 10]`. Validated on [`build()`](Self::build).
    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.config.parameters.max_depth = depth;
        self
    }

    /// Set the learning rate.
    ///
    /// Must be in `(0, 1]`. Validated on [`build()`](Self::build).
    #[must_use]
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.config.parameters.learning_rate = rate;
        self
    }

    /// Set the number of boosting rounds.
    ///
    /// Must be in `[1, 1000]`. Validated on [`build()`](Self::build).
    #[must_use]
    pub fn n_estimators(mut self, n: u32) -> Self {
        self.config.parameters.n_estimators = n;
        self
    }

    /// Set the fraction of rows held out for evaluation.
    #[must_use]
    pub fn test_size(mut self, size: f64) -> Self {
        self.config.test_size = size;
        self
    }

    /// Fix the train/test partition seed.
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    /// Use an explicit feature pipeline instead of inferred roles.
    #[must_use]
    pub fn pipeline(mut self, pipeline: DataPipelineConfig) -> Self {
        self.config.pipeline = Some(pipeline);
        self
    }

    /// Set the strategies used with inferred feature roles.
    #[must_use]
    pub fn preprocessing(mut self, options: PreprocessingOptions) -> Self {
        self.config.preprocessing = options;
        self
    }

    /// Build the configuration, validating all parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] if any rule listed on
    /// [`TrainConfig`] is violated.
    pub fn build(self) -> Result<TrainConfig, TrainingError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
