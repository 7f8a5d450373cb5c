//! Configuration types for the feature preprocessing pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Scaling applied to numeric features after outlier handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScalingMethod {
    /// `(x - mean) / std` with the population standard deviation
    #[default]
    #[serde(rename = "standard")]
    Standard,
    /// `x * scale + min`, mapping the fitted range onto `[0, 1]`
    #[serde(rename = "minmax", alias = "min_max")]
    MinMax,
}

impl ScalingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::MinMax => "minmax",
        }
    }
}

/// Strategy for handling missing values.
///
/// Statistic-based strategies apply to numeric columns only; categorical
/// nulls are always filled with the column mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingValueStrategy {
    /// Use the mean of non-null values
    #[default]
    Mean,
    /// Use the median of non-null values
    Median,
    /// Use the most frequent value, smallest value on ties
    Mode,
    /// Drop rows with a null in any declared feature
    Drop,
}

impl MissingValueStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::Drop => "drop",
        }
    }
}

fn default_handle_outliers() -> bool {
    true
}

fn default_outlier_threshold() -> f64 {
    3.0
}

/// Strategy knobs shared by explicit and inferred pipeline configurations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingOptions {
    #[serde(default)]
    pub scaling_method: ScalingMethod,
    #[serde(default)]
    pub handle_missing: MissingValueStrategy,
    #[serde(default = "default_handle_outliers")]
    pub handle_outliers: bool,
    #[serde(default = "default_outlier_threshold")]
    pub outlier_threshold: f64,
}

impl Default for PreprocessingOptions {
    fn default() -> Self {
        Self {
            scaling_method: ScalingMethod::default(),
            handle_missing: MissingValueStrategy::default(),
            handle_outliers: default_handle_outliers(),
            outlier_threshold: default_outlier_threshold(),
        }
    }
}

/// Configuration for the feature preprocessing pipeline.
///
/// `features` fixes the output column order. `categorical_features` and
/// `numeric_features` must partition it exactly.
///
/// # Example
///
/// ```rust
/// use treeline_processing::config::{DataPipelineConfig, ScalingMethod};
///
/// let config = DataPipelineConfig::builder()
///     .features(["age", "city"])
///     .categorical_features(["city"])
///     .numeric_features(["age"])
///     .scaling_method(ScalingMethod::MinMax)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.features, vec!["age", "city"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPipelineConfig {
    /// Ordered list of feature columns; defines the output column order.
    pub features: Vec<String>,

    /// Features encoded with an integer label encoder.
    #[serde(default)]
    pub categorical_features: Vec<String>,

    /// Features imputed, outlier-handled and scaled.
    #[serde(default)]
    pub numeric_features: Vec<String>,

    /// Default: standard
    #[serde(default)]
    pub scaling_method: ScalingMethod,

    /// Default: mean
    #[serde(default)]
    pub handle_missing: MissingValueStrategy,

    /// Default: true
    #[serde(default = "default_handle_outliers")]
    pub handle_outliers: bool,

    /// Z-score cutoff. Default: 3.0
    #[serde(default = "default_outlier_threshold")]
    pub outlier_threshold: f64,
}

impl DataPipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DataPipelineConfigBuilder {
        DataPipelineConfigBuilder::default()
    }

    /// Build a configuration from already inferred feature roles.
    ///
    /// `features` keeps the order given; each name must appear in exactly
    /// one of the role lists.
    pub fn from_roles(
        features: Vec<String>,
        categorical_features: Vec<String>,
        numeric_features: Vec<String>,
        options: PreprocessingOptions,
    ) -> Result<Self, ConfigValidationError> {
        let config = Self {
            features,
            categorical_features,
            numeric_features,
            scaling_method: options.scaling_method,
            handle_missing: options.handle_missing,
            handle_outliers: options.handle_outliers,
            outlier_threshold: options.outlier_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    /// The strategy knobs of this configuration.
    pub fn options(&self) -> PreprocessingOptions {
        PreprocessingOptions {
            scaling_method: self.scaling_method,
            handle_missing: self.handle_missing,
            handle_outliers: self.handle_outliers,
            outlier_threshold: self.outlier_threshold,
        }
    }

    /// Whether `name` is declared as a categorical feature.
    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical_features.iter().any(|f| f == name)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.features.is_empty() {
            return Err(ConfigValidationError::EmptyFeatures);
        }

        let mut seen = HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.as_str()) {
                return Err(ConfigValidationError::DuplicateFeature(feature.clone()));
            }
        }

        let categorical: HashSet<&str> =
            self.categorical_features.iter().map(String::as_str).collect();
        let numeric: HashSet<&str> = self.numeric_features.iter().map(String::as_str).collect();

        if categorical.len() != self.categorical_features.len()
            || numeric.len() != self.numeric_features.len()
        {
            return Err(ConfigValidationError::PartitionMismatch(
                "a feature is listed twice within one role".to_string(),
            ));
        }

        if let Some(both) = categorical.intersection(&numeric).next() {
            return Err(ConfigValidationError::PartitionMismatch(format!(
                "'{}' is both categorical and numeric",
                both
            )));
        }

        for feature in &self.features {
            if !categorical.contains(feature.as_str()) && !numeric.contains(feature.as_str()) {
                return Err(ConfigValidationError::PartitionMismatch(format!(
                    "'{}' has no role",
                    feature
                )));
            }
        }

        if let Some(extra) = categorical
            .iter()
            .chain(numeric.iter())
            .find(|name| !seen.contains(**name))
        {
            return Err(ConfigValidationError::PartitionMismatch(format!(
                "'{}' is not listed in features",
                extra
            )));
        }

        if !self.outlier_threshold.is_finite() || self.outlier_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidOutlierThreshold(
                self.outlier_threshold,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("At least one feature must be declared")]
    EmptyFeatures,

    #[error("Feature '{0}' is declared more than once")]
    DuplicateFeature(String),

    #[error("Categorical and numeric features must partition features: {0}")]
    PartitionMismatch(String),

    #[error("Invalid outlier threshold: {0} (must be a positive finite number)")]
    InvalidOutlierThreshold(f64),
}

/// Builder for [`DataPipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DataPipelineConfigBuilder {
    features: Option<Vec<String>>,
    categorical_features: Vec<String>,
    numeric_features: Vec<String>,
    scaling_method: Option<ScalingMethod>,
    handle_missing: Option<MissingValueStrategy>,
    handle_outliers: Option<bool>,
    outlier_threshold: Option<f64>,
}

impl DataPipelineConfigBuilder {
    /// Set the output feature order.
    ///
    /// When omitted, categorical features come first, then numeric ones.
    pub fn features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    pub fn categorical_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn numeric_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn scaling_method(mut self, method: ScalingMethod) -> Self {
        self.scaling_method = Some(method);
        self
    }

    pub fn handle_missing(mut self, strategy: MissingValueStrategy) -> Self {
        self.handle_missing = Some(strategy);
        self
    }

    /// Enable or disable z-score outlier replacement.
    pub fn handle_outliers(mut self, enabled: bool) -> Self {
        self.handle_outliers = Some(enabled);
        self
    }

    /// Set the z-score cutoff used for outlier replacement.
    pub fn outlier_threshold(mut self, threshold: f64) -> Self {
        self.outlier_threshold = Some(threshold);
        self
    }

    /// Apply every knob from a [`PreprocessingOptions`] block.
    pub fn options(self, options: PreprocessingOptions) -> Self {
        self.scaling_method(options.scaling_method)
            .handle_missing(options.handle_missing)
            .handle_outliers(options.handle_outliers)
            .outlier_threshold(options.outlier_threshold)
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DataPipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<DataPipelineConfig, ConfigValidationError> {
        let features = self.features.unwrap_or_else(|| {
            self.categorical_features
                .iter()
                .chain(self.numeric_features.iter())
                .cloned()
                .collect()
        });

        let config = DataPipelineConfig {
            features,
            categorical_features: self.categorical_features,
            numeric_features: self.numeric_features,
            scaling_method: self.scaling_method.unwrap_or_default(),
            handle_missing: self.handle_missing.unwrap_or_default(),
            handle_outliers: self.handle_outliers.unwrap_or(true),
            outlier_threshold: self.outlier_threshold.unwrap_or(3.0),
        };

        config.validate()?;
        Ok(config)
    }
}
