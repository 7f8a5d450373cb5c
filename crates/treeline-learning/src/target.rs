//! Target column encoding.
//!
//! Turns the raw target series into the `f64` labels the booster trains on,
//! together with the index to label mapping reported for classification.

use polars::prelude::*;
use std::collections::BTreeMap;
use treeline_processing::LabelEncoder;
use treeline_processing::utils::{DtypeCategory, get_dtype_category, numeric_values, string_values};

use crate::config::TaskType;
use crate::error::{Result, TrainingError};

/// Labels for a numeric 0/1 binary target.
const BINARY_NUMERIC_LABELS: [&str; 2] = ["class_0", "class_1"];

/// An encoded target column.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodedTarget {
    /// Regression values, or class indices stored as `f64`.
    pub values: Vec<f64>,
    /// Class index to original label; `None` for regression.
    pub class_mapping: Option<BTreeMap<usize, String>>,
}

impl EncodedTarget {
    pub fn n_classes(&self) -> Option<usize> {
        self.class_mapping.as_ref().map(BTreeMap::len)
    }

    /// Keep the rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Vec<f64> {
        indices.iter().map(|&i| self.values[i]).collect()
    }
}

/// Encode `series` for `task`.
///
/// - regression: the column must be numeric and is used as-is;
/// - binary classification on a numeric column: values must be 0 or 1 and map
///   to `class_0`/`class_1`;
/// - any other classification: classes are sorted (numerically for numeric
///   columns) and replaced by their index.
///
/// Nulls must have been removed beforehand.
pub(crate) fn encode_target(series: &Series, task: TaskType) -> Result<EncodedTarget> {
    let name = series.name().to_string();
    let category = get_dtype_category(series.dtype());

    if matches!(category, DtypeCategory::Datetime | DtypeCategory::Other) {
        return Err(TrainingError::InvalidTarget(format!(
            "target '{}' has unsupported dtype {}",
            name,
            series.dtype()
        )));
    }

    let encoded = match (task, category) {
        (TaskType::Regression, DtypeCategory::Numeric) => EncodedTarget {
            values: required_numbers(series)?,
            class_mapping: None,
        },
        (TaskType::Regression, _) => {
            return Err(TrainingError::InvalidTarget(format!(
                "regression target '{}' must be numeric, found dtype {}",
                name,
                series.dtype()
            )));
        }
        (TaskType::BinaryClassification, DtypeCategory::Numeric) => encode_binary_numeric(series)?,
        (_, DtypeCategory::Numeric) => encode_numeric_classes(series)?,
        _ => encode_string_classes(series)?,
    };

    if let Some(n_classes) = encoded.n_classes() {
        if n_classes < 2 {
            return Err(TrainingError::InvalidTarget(format!(
                "target '{}' needs at least two classes, found {}",
                name, n_classes
            )));
        }
        if task == TaskType::BinaryClassification && n_classes > 2 {
            return Err(TrainingError::InvalidTarget(format!(
                "binary classification target '{}' has {} classes; use multiclass_classification",
                name, n_classes
            )));
        }
    }

    Ok(encoded)
}

fn required_numbers(series: &Series) -> Result<Vec<f64>> {
    numeric_values(series)?
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                TrainingError::InvalidTarget(format!(
                    "target '{}' contains null values",
                    series.name()
                ))
            })
        })
        .collect()
}

fn encode_binary_numeric(series: &Series) -> Result<EncodedTarget> {
    let values = required_numbers(series)?;
    if let Some(bad) = values.iter().find(|v| **v != 0.0 && **v != 1.0) {
        return Err(TrainingError::InvalidTarget(format!(
            "numeric binary target '{}' must contain only 0 and 1, found {}",
            series.name(),
            bad
        )));
    }

    let class_mapping = BINARY_NUMERIC_LABELS
        .iter()
        .enumerate()
        .filter(|(i, _)| values.contains(&(*i as f64)))
        .map(|(i, label)| (i, label.to_string()))
        .collect();

    Ok(EncodedTarget {
        values,
        class_mapping: Some(class_mapping),
    })
}

fn encode_numeric_classes(series: &Series) -> Result<EncodedTarget> {
    let values = required_numbers(series)?;
    let mut classes = values.clone();
    classes.sort_by(f64::total_cmp);
    classes.dedup();

    let codes = values
        .iter()
        .map(|v| {
            classes
                .binary_search_by(|c| c.total_cmp(v))
                .map(|i| i as f64)
                .unwrap_or_default()
        })
        .collect();

    Ok(EncodedTarget {
        values: codes,
        class_mapping: Some(
            classes
                .iter()
                .enumerate()
                .map(|(i, c)| (i, format_class_label(*c)))
                .collect(),
        ),
    })
}

fn encode_string_classes(series: &Series) -> Result<EncodedTarget> {
    let raw = string_values(series)?;
    let labels: Vec<String> = raw
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                TrainingError::InvalidTarget(format!(
                    "target '{}' contains null values",
                    series.name()
                ))
            })
        })
        .collect::<Result<_>>()?;

    let encoder = LabelEncoder::fit(labels.iter().map(String::as_str));
    let values = labels
        .iter()
        .map(|label| encoder.encode_or_first(label) as f64)
        .collect();

    Ok(EncodedTarget {
        values,
        class_mapping: Some(encoder.inverse_mapping()),
    })
}

/// Render a numeric class without a trailing `.0` for whole numbers.
fn format_class_label(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
