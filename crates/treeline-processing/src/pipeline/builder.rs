//! Feature pipeline module.
//!
//! This module provides the stateful [`FeaturePipeline`] and its builder.
//! `fit` learns encoders, scaler parameters and fill values from a training
//! frame; `transform` replays them on any frame with the same features.

use ndarray::Array2;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::{DataPipelineConfig, MissingValueStrategy};
use crate::encoders::LabelEncoder;
use crate::error::{PreprocessingError, Result};
use crate::pipeline::executor::PreprocessingExecutor;
use crate::scalers::NumericScaler;
use crate::types::{
    FeatureMetadata, FeatureTransform, FillValue, PipelineMetadata, TransformedFrame,
};

/// State learned by [`FeaturePipeline::fit`].
#[derive(Debug, Clone)]
struct FittedState {
    encoders: HashMap<String, LabelEncoder>,
    scaler: NumericScaler,
    fill_values: HashMap<String, FillValue>,
    metadata: Vec<FeatureMetadata>,
}

/// Stateful fit/transform preprocessing for mixed categorical and numeric
/// features.
///
/// # Example
///
/// ```rust
/// use polars::prelude::*;
/// use treeline_processing::{DataPipelineConfig, FeaturePipeline};
///
/// let df = df![
///     "age" => [22.0, 35.0, 58.0],
///     "city" => ["paris", "rome", "paris"],
/// ]
/// .unwrap();
///
/// let config = DataPipelineConfig::builder()
///     .features(["age", "city"])
///     .categorical_features(["city"])
///     .numeric_features(["age"])
///     .build()
///     .unwrap();
///
/// let mut pipeline = FeaturePipeline::new(config);
/// pipeline.fit(&df).unwrap();
/// let out = pipeline.transform(&df).unwrap();
///
/// assert_eq!(out.feature_names, vec!["age", "city"]);
/// assert_eq!(out.matrix.shape(), &[3, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: DataPipelineConfig,
    state: Option<FittedState>,
}

// Training runs on a blocking worker thread.
static_assertions::assert_impl_all!(FeaturePipeline: Send, Sync);

impl FeaturePipeline {
    /// Create an unfitted pipeline from a validated configuration.
    pub fn new(config: DataPipelineConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create a new pipeline builder.
    pub fn builder() -> FeaturePipelineBuilder {
        FeaturePipelineBuilder::default()
    }

    pub fn config(&self) -> &DataPipelineConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Fit on a frame holding (at least) every declared feature.
    ///
    /// Order: missing values, categorical encoders, numeric outliers,
    /// numeric scaler. Prior state is discarded; on failure the pipeline is
    /// left unfitted.
    pub fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.state = None;
        let state = self.fit_state(df)?;
        self.state = Some(state);
        Ok(())
    }

    /// Fit, then transform the same frame.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<TransformedFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    fn fit_state(&self, df: &DataFrame) -> Result<FittedState> {
        let config = &self.config;
        info!(
            "Fitting feature pipeline on {} rows ({} categorical, {} numeric)",
            df.height(),
            config.categorical_features.len(),
            config.numeric_features.len()
        );

        let mut frame = PreprocessingExecutor::extract(df, config)?;
        if frame.n_rows() == 0 {
            return Err(PreprocessingError::EmptyDataset(
                "cannot fit on a frame with no rows".to_string(),
            ));
        }

        if config.handle_missing == MissingValueStrategy::Drop {
            PreprocessingExecutor::drop_incomplete_rows(&mut frame, &config.features)?;
            if frame.n_rows() == 0 {
                return Err(PreprocessingError::EmptyDataset(
                    "every row has a missing feature value".to_string(),
                ));
            }
        }

        let fill_values = PreprocessingExecutor::impute(&mut frame, config.handle_missing, None)?;

        let mut encoders = HashMap::new();
        for name in config.features.iter().filter(|f| config.is_categorical(f)) {
            let values = frame.series(name)?.str()?;
            let encoder = LabelEncoder::fit(values.into_no_null_iter());
            debug!("Encoded '{}' with {} classes", name, encoder.n_classes());
            encoders.insert(name.clone(), encoder);
        }

        if config.handle_outliers {
            PreprocessingExecutor::replace_outliers(&mut frame, config.outlier_threshold)?;
        }

        let numeric = config
            .features
            .iter()
            .filter(|f| !config.is_categorical(f))
            .map(|name| frame.series(name))
            .collect::<Result<Vec<_>>>()?;
        let scaler = NumericScaler::fit(config.scaling_method, numeric)?;

        let mut metadata = Vec::with_capacity(config.features.len());
        for name in &config.features {
            let transform = match encoders.get(name) {
                Some(encoder) => FeatureTransform::Categorical {
                    mapping: encoder.mapping(),
                },
                None => FeatureTransform::Numeric {
                    scaling: *scaler
                        .params(name)
                        .ok_or_else(|| PreprocessingError::ColumnNotFound(name.clone()))?,
                },
            };
            metadata.push(FeatureMetadata {
                name: name.clone(),
                transform,
                fill_value: fill_values.get(name).cloned(),
            });
        }

        Ok(FittedState {
            encoders,
            scaler,
            fill_values,
            metadata,
        })
    }

    /// Apply the fitted state to `df`.
    ///
    /// Missing-value and outlier statistics are recomputed on `df`; fit-time
    /// fill values are used only for columns with no non-null value.
    /// Categories unseen during fit encode to the first known class.
    pub fn transform(&self, df: &DataFrame) -> Result<TransformedFrame> {
        let state = self.state.as_ref().ok_or(PreprocessingError::NotFitted)?;
        let config = &self.config;

        let mut frame = PreprocessingExecutor::extract(df, config)?;
        if config.handle_missing == MissingValueStrategy::Drop {
            PreprocessingExecutor::drop_incomplete_rows(&mut frame, &config.features)?;
        }
        PreprocessingExecutor::impute(
            &mut frame,
            config.handle_missing,
            Some(&state.fill_values),
        )?;
        if config.handle_outliers {
            PreprocessingExecutor::replace_outliers(&mut frame, config.outlier_threshold)?;
        }

        let mut encoded: Vec<Vec<f64>> = Vec::with_capacity(config.features.len());
        for name in &config.features {
            let series = frame.series(name)?;
            let values = match state.encoders.get(name) {
                Some(encoder) => {
                    let mut unseen = 0usize;
                    let codes: Vec<f64> = series
                        .str()?
                        .into_no_null_iter()
                        .map(|v| {
                            encoder.code(v).unwrap_or_else(|| {
                                unseen += 1;
                                0
                            }) as f64
                        })
                        .collect();
                    if unseen > 0 {
                        debug!(
                            "{} unseen categories in '{}' mapped to first class",
                            unseen, name
                        );
                    }
                    codes
                }
                None => state
                    .scaler
                    .transform_column(series)?
                    .f64()?
                    .into_no_null_iter()
                    .collect(),
            };
            encoded.push(values);
        }

        let n_rows = frame.n_rows();
        let matrix = Array2::from_shape_fn((n_rows, encoded.len()), |(r, c)| encoded[c][r]);

        Ok(TransformedFrame {
            matrix,
            feature_names: config.features.clone(),
            row_indices: frame.row_indices,
        })
    }

    /// Serializable description of the fitted transform.
    pub fn export_metadata(&self) -> Result<PipelineMetadata> {
        let state = self.state.as_ref().ok_or(PreprocessingError::NotFitted)?;
        Ok(PipelineMetadata {
            features: self.config.features.clone(),
            scaling_method: self.config.scaling_method,
            handle_missing: self.config.handle_missing,
            handle_outliers: self.config.handle_outliers,
            outlier_threshold: self.config.outlier_threshold,
            feature_metadata: state.metadata.clone(),
        })
    }

    /// [`export_metadata`](Self::export_metadata) as pretty JSON text.
    pub fn export_metadata_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_metadata()?)?)
    }
}

/// Builder for [`FeaturePipeline`].
#[derive(Debug, Default)]
pub struct FeaturePipelineBuilder {
    config: Option<DataPipelineConfig>,
}

impl FeaturePipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: DataPipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if no configuration was given or it is invalid.
    pub fn build(self) -> Result<FeaturePipeline> {
        let config = self.config.ok_or_else(|| {
            PreprocessingError::InvalidConfig("a pipeline configuration is required".to_string())
        })?;
        config.validate()?;
        Ok(FeaturePipeline::new(config))
    }
}
