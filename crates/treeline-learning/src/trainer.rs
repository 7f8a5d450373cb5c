//! Training orchestration.
//!
//! This module provides [`Trainer`], which runs one training request end to
//! end: target extraction, feature preprocessing, target encoding, the
//! train/test split, boosting, evaluation and artifact assembly.
//!
//! # Stages
//!
//! 1. Validate the configuration and split the target column off the frame.
//!    Rows with a null target are dropped with a warning.
//! 2. Use the explicit pipeline configuration, or infer feature roles from
//!    column dtypes.
//! 3. Fit the preprocessing pipeline and transform the features to a dense
//!    matrix.
//! 4. Encode the target for the task type.
//! 5. Split rows into train and test partitions.
//! 6. Fit the booster on the training partition.
//! 7. Compute train and test metrics.
//! 8. Normalise feature importances into `[0, 1]`.
//! 9. Serialize the model and base64-encode it.
//! 10. Assemble the [`TrainingResult`].
//!
//! Any failure aborts the run; there are no partial results.
//!
//! # Example
//!
//! ```rust,ignore
//! use treeline_learning::{TaskType, TrainConfig, Trainer};
//! use treeline_processing::read_frame_from_path;
//!
//! let df = read_frame_from_path("customers.csv")?;
//! let config = TrainConfig::builder()
//!     .target_column("churned")
//!     .task_type(TaskType::BinaryClassification)
//!     .random_seed(42)
//!     .build()?;
//!
//! let result = Trainer::new(config)?.train(&df)?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use ndarray::{Array2, Axis};
use polars::prelude::*;
use tracing::{debug, info, warn};
use treeline_processing::{DataPipelineConfig, DataProfiler, FeaturePipeline};

use crate::backend::{Booster, GbdtBooster};
use crate::config::TrainConfig;
use crate::error::{Result, TrainingError};
use crate::metrics::{accuracy, confusion_matrix, normalize_importances, rmse};
use crate::model::TrainedModel;
use crate::split::train_test_split;
use crate::target::{EncodedTarget, encode_target};
use crate::types::{
    Artifacts, ClassificationMetrics, MODEL_FORMAT_JSON, Metrics, ModelArtifact,
    RegressionMetrics, STATUS_SUCCESS, TestPredictions, TrainingResult,
};

/// Runs training requests for one [`TrainConfig`].
///
/// A trainer holds no fitted state: every call to [`train`](Self::train)
/// builds its own pipeline and model, so one trainer can serve many frames.
///
/// # Thread Safety
///
/// `Trainer` is `Send + Sync`; training itself is synchronous and should run
/// on a blocking worker when called from async code.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainConfig,
}

static_assertions::assert_impl_all!(Trainer: Send, Sync);

impl Trainer {
    /// Create a trainer, validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: TrainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this trainer runs with.
    #[must_use]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train on `df` and return the serializable result.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError`] if:
    /// - [`TargetNotFound`](TrainingError::TargetNotFound): the target column is absent
    /// - [`InvalidTarget`](TrainingError::InvalidTarget): the target does not fit the task type
    /// - [`InvalidData`](TrainingError::InvalidData): too few rows remain to split
    /// - [`Preprocessing`](TrainingError::Preprocessing): the feature pipeline failed,
    ///   e.g. declared features are missing
    /// - [`TrainingFailed`](TrainingError::TrainingFailed) or
    ///   [`Serialization`](TrainingError::Serialization): the boosting library failed
    pub fn train(&self, df: &DataFrame) -> Result<TrainingResult> {
        self.train_model(df).map(|(result, _)| result)
    }

    /// Train on `df` and also return the in-memory model.
    ///
    /// Errors are the same as for [`train`](Self::train).
    pub fn train_model(&self, df: &DataFrame) -> Result<(TrainingResult, TrainedModel)> {
        let config = &self.config;
        info!(
            "Training {} model on {} rows x {} columns (target '{}')",
            config.task_type,
            df.height(),
            df.width(),
            config.target_column
        );

        // 1. target
        let (features, target) = split_target(df, &config.target_column)?;

        // 2-3. features
        let pipeline_config = self.pipeline_config(&features)?;
        let mut pipeline = FeaturePipeline::new(pipeline_config);
        let transformed = pipeline.fit_transform(&features)?;
        if transformed.n_rows() == 0 {
            return Err(TrainingError::InvalidData(
                "no rows left after missing-value handling".to_string(),
            ));
        }
        debug!(
            "Preprocessed {} rows into {} features",
            transformed.n_rows(),
            transformed.n_features()
        );

        // 4. target encoding, aligned with the rows the pipeline kept
        let encoded = encode_target(&target, config.task_type)?;
        let labels = encoded.select(&transformed.row_indices);

        // 5. split
        let split = train_test_split(labels.len(), config.test_size, config.random_seed)?;
        let x_train = transformed.matrix.select(Axis(0), &split.train);
        let x_test = transformed.matrix.select(Axis(0), &split.test);
        let y_train: Vec<f64> = split.train.iter().map(|&i| labels[i]).collect();
        let y_test: Vec<f64> = split.test.iter().map(|&i| labels[i]).collect();
        debug!(
            "Split into {} training and {} test rows",
            y_train.len(),
            y_test.len()
        );

        // 6. fit
        let mut booster = GbdtBooster::new(
            config.task_type,
            config.parameters,
            transformed.n_features(),
            encoded.n_classes(),
        )?;
        booster.fit(x_train.view(), &y_train)?;

        // 7. metrics
        let metrics = evaluate(
            &booster,
            &encoded,
            (&x_train, y_train.as_slice()),
            (&x_test, y_test.as_slice()),
        )?;

        // 8. importances
        let feature_importance = normalize_importances(&booster.feature_importances()?);

        // 9. artifact
        let feature_names = transformed.feature_names.clone();
        let model = TrainedModel::new(booster, feature_names.clone(), encoded.class_mapping.clone());
        let model_bytes = model.to_bytes()?;
        debug!("Serialized model to {} bytes", model_bytes.len());

        // 10. result
        let result = TrainingResult {
            status: STATUS_SUCCESS.to_string(),
            task_type: config.task_type,
            metrics,
            feature_importance,
            feature_names,
            class_mapping: encoded.class_mapping,
            artifacts: Artifacts {
                model: ModelArtifact {
                    data: BASE64_STANDARD.encode(&model_bytes),
                    format: MODEL_FORMAT_JSON.to_string(),
                },
                client_module: None,
            },
            pipeline_metadata: pipeline.export_metadata()?,
        };

        info!("Training finished: {}", summarize(&result.metrics));
        Ok((result, model))
    }

    fn pipeline_config(&self, features: &DataFrame) -> Result<DataPipelineConfig> {
        if let Some(explicit) = &self.config.pipeline {
            return Ok(explicit.clone());
        }

        DataProfiler::infer_feature_roles(features)
            .into_config(self.config.preprocessing)
            .map_err(|e| TrainingError::InvalidConfig(format!("no usable feature columns: {e}")))
    }
}

/// Train once with `config`.
///
/// Shorthand for `Trainer::new(config.clone())?.train(df)`.
pub fn train(df: &DataFrame, config: &TrainConfig) -> Result<TrainingResult> {
    Trainer::new(config.clone())?.train(df)
}

/// Separate the target column, dropping rows where it is null.
fn split_target(df: &DataFrame, target_column: &str) -> Result<(DataFrame, Series)> {
    let target = df
        .column(target_column)
        .map_err(|_| TrainingError::TargetNotFound(target_column.to_string()))?
        .as_materialized_series()
        .clone();

    let frame = if target.null_count() > 0 {
        warn!(
            "Dropping {} rows with a null '{}' target",
            target.null_count(),
            target_column
        );
        df.filter(&target.is_not_null())?
    } else {
        df.clone()
    };

    if frame.height() == 0 {
        return Err(TrainingError::InvalidData(format!(
            "target '{}' has no non-null values",
            target_column
        )));
    }

    let target = frame.column(target_column)?.as_materialized_series().clone();
    let features = frame.drop(target_column)?;
    Ok((features, target))
}

fn evaluate(
    booster: &GbdtBooster,
    encoded: &EncodedTarget,
    (x_train, y_train): (&Array2<f64>, &[f64]),
    (x_test, y_test): (&Array2<f64>, &[f64]),
) -> Result<Metrics> {
    let train_pred = booster.predict(x_train.view())?;
    let test_pred = booster.predict(x_test.view())?;
    let n_features = booster.n_features();

    let Some(class_mapping) = &encoded.class_mapping else {
        return Ok(Metrics::Regression(RegressionMetrics {
            train_rmse: rmse(y_train, &train_pred),
            test_rmse: rmse(y_test, &test_pred),
            n_features,
            test_predictions: TestPredictions {
                actual: y_test.to_vec(),
                predicted: test_pred,
            },
        }));
    };

    let as_classes = |values: &[f64]| values.iter().map(|v| *v as usize).collect::<Vec<_>>();
    let (train_actual, train_predicted) = (as_classes(y_train), as_classes(&train_pred));
    let (test_actual, test_predicted) = (as_classes(y_test), as_classes(&test_pred));

    Ok(Metrics::Classification(ClassificationMetrics {
        train_accuracy: accuracy(&train_actual, &train_predicted),
        test_accuracy: accuracy(&test_actual, &test_predicted),
        n_classes: class_mapping.len(),
        n_features,
        confusion_matrix: confusion_matrix(&test_actual, &test_predicted, class_mapping),
    }))
}

fn summarize(metrics: &Metrics) -> String {
    match metrics {
        Metrics::Regression(m) => format!("train_rmse={:.4} test_rmse={:.4}", m.train_rmse, m.test_rmse),
        Metrics::Classification(m) => format!(
            "train_accuracy={:.4} test_accuracy={:.4}",
            m.train_accuracy, m.test_accuracy
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskType;
    use pretty_assertions::assert_eq;

    fn binary_frame() -> DataFrame {
        df![
            "x" => (0..20).map(|i| i as f64).collect::<Vec<_>>(),
            "label" => (0..20).map(|i| if i < 10 { "low" } else { "high" }).collect::<Vec<_>>(),
        ]
        .unwrap()
    }

    fn config(task: TaskType, target: &str) -> TrainConfig {
        TrainConfig::builder()
            .target_column(target)
            .task_type(task)
            .n_estimators(10)
            .random_seed(3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_target_is_user_error() {
        let trainer = Trainer::new(config(TaskType::BinaryClassification, "nope")).unwrap();
        let err = trainer.train(&binary_frame()).unwrap_err();
        assert!(matches!(&err, TrainingError::TargetNotFound(name) if name == "nope"));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_null_targets_are_dropped() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0],
            "y" => [Some(1.0), None, Some(3.0), Some(4.0)],
        ]
        .unwrap();
        let (features, target) = split_target(&df, "y").unwrap();
        assert_eq!(features.height(), 3);
        assert_eq!(features.width(), 1);
        assert!(features.column("y").is_err());
        assert_eq!(target.null_count(), 0);
    }

    #[test]
    fn test_all_null_target_rejected() {
        let df = df!["x" => [1.0, 2.0], "y" => [None::<f64>, None]].unwrap();
        let err = split_target(&df, "y").unwrap_err();
        assert!(matches!(err, TrainingError::InvalidData(_)));
    }

    #[test]
    fn test_binary_run_reports_classification_metrics() {
        let trainer = Trainer::new(config(TaskType::BinaryClassification, "label")).unwrap();
        let (result, model) = trainer.train_model(&binary_frame()).unwrap();

        assert_eq!(result.status, "success");
        assert_eq!(result.feature_names, vec!["x"]);
        match &result.metrics {
            Metrics::Classification(m) => {
                assert_eq!(m.n_classes, 2);
                assert!((0.0..=1.0).contains(&m.test_accuracy));
                assert_eq!(m.confusion_matrix.matrix.iter().flatten().sum::<usize>(), 4);
            }
            other => panic!("unexpected metrics: {other:?}"),
        }
        assert_eq!(model.feature_names(), result.feature_names.as_slice());
    }

    #[test]
    fn test_regression_rejects_string_target() {
        let trainer = Trainer::new(config(TaskType::Regression, "label")).unwrap();
        let err = trainer.train(&binary_frame()).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidTarget(_)));
    }

    #[test]
    fn test_frame_without_usable_features() {
        let df = df!["label" => ["a", "b", "a", "b"]].unwrap();
        let trainer = Trainer::new(config(TaskType::BinaryClassification, "label")).unwrap();
        let err = trainer.train(&df).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidConfig(_)));
    }
}
