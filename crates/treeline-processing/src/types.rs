//! Data types describing fitted preprocessing state.
//!
//! Everything here is plain data: serializable, cloneable and free of
//! behaviour beyond small lookups. The pipeline produces these; external
//! consumers (generated client code, model artifacts) read them.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{MissingValueStrategy, ScalingMethod};

/// Role of a feature inside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureDtype {
    Numeric,
    Categorical,
}

/// Fitted scaling parameters for one numeric column.
///
/// Standard scaling computes `(x - mean) / scale`; min-max scaling computes
/// `x * scale + min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalingParams {
    Standard { mean: f64, scale: f64 },
    MinMax { min: f64, scale: f64 },
}

impl ScalingParams {
    /// Apply the fitted transform to a single value.
    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            Self::Standard { mean, scale } => (x - mean) / scale,
            Self::MinMax { min, scale } => x * scale + min,
        }
    }

    pub fn method(&self) -> ScalingMethod {
        match self {
            Self::Standard { .. } => ScalingMethod::Standard,
            Self::MinMax { .. } => ScalingMethod::MinMax,
        }
    }
}

/// A fit-time imputation value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

/// Per-feature transform description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", rename_all = "snake_case")]
pub enum FeatureTransform {
    /// Observed category (as string) to integer code.
    Categorical { mapping: BTreeMap<String, u32> },
    Numeric { scaling: ScalingParams },
}

/// Metadata for one fitted feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMetadata {
    pub name: String,
    #[serde(flatten)]
    pub transform: FeatureTransform,
    /// Value used when a transformed column has no non-null entry at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<FillValue>,
}

impl FeatureMetadata {
    pub fn dtype(&self) -> FeatureDtype {
        match self.transform {
            FeatureTransform::Categorical { .. } => FeatureDtype::Categorical,
            FeatureTransform::Numeric { .. } => FeatureDtype::Numeric,
        }
    }
}

/// Serializable description of a fitted pipeline.
///
/// Contains everything needed to replay `transform` on new rows without
/// access to the training frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    /// Output column order.
    pub features: Vec<String>,
    pub scaling_method: ScalingMethod,
    pub handle_missing: MissingValueStrategy,
    pub handle_outliers: bool,
    pub outlier_threshold: f64,
    /// One entry per feature, in `features` order.
    pub feature_metadata: Vec<FeatureMetadata>,
}

impl PipelineMetadata {
    /// Look up the metadata of a feature by name.
    pub fn feature(&self, name: &str) -> Option<&FeatureMetadata> {
        self.feature_metadata.iter().find(|m| m.name == name)
    }

    /// Category to code map of a categorical feature.
    pub fn categorical_mapping(&self, name: &str) -> Option<&BTreeMap<String, u32>> {
        match &self.feature(name)?.transform {
            FeatureTransform::Categorical { mapping } => Some(mapping),
            FeatureTransform::Numeric { .. } => None,
        }
    }

    /// Scaling parameters of a numeric feature.
    pub fn scaling_params(&self, name: &str) -> Option<&ScalingParams> {
        match &self.feature(name)?.transform {
            FeatureTransform::Numeric { scaling } => Some(scaling),
            FeatureTransform::Categorical { .. } => None,
        }
    }

    pub fn categorical_features(&self) -> impl Iterator<Item = &FeatureMetadata> {
        self.feature_metadata
            .iter()
            .filter(|m| m.dtype() == FeatureDtype::Categorical)
    }

    pub fn numeric_features(&self) -> impl Iterator<Item = &FeatureMetadata> {
        self.feature_metadata
            .iter()
            .filter(|m| m.dtype() == FeatureDtype::Numeric)
    }
}

/// Output of [`FeaturePipeline::transform`](crate::pipeline::FeaturePipeline::transform).
#[derive(Debug, Clone)]
pub struct TransformedFrame {
    /// Dense `rows x features` matrix.
    pub matrix: Array2<f64>,
    /// Column names of `matrix`, in order.
    pub feature_names: Vec<String>,
    /// Index into the source frame of every output row.
    pub row_indices: Vec<usize>,
}

impl TransformedFrame {
    pub fn n_rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.matrix.ncols()
    }

    /// True when no row was removed by missing-value handling.
    pub fn is_row_preserving(&self, source_rows: usize) -> bool {
        self.row_indices.len() == source_rows
    }
}
