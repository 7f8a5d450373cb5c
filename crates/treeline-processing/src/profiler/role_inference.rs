//! Role inference logic for feature columns.

use polars::prelude::*;
use serde::Serialize;

use crate::utils::{DtypeCategory, get_dtype_category};

/// How a column takes part in preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureRole {
    Numeric,
    Categorical,
    /// Dtype the pipeline cannot encode (dates, lists, structs, ...).
    Skipped,
}

/// Infer the role of a column from its dtype alone.
///
/// String, categorical and boolean columns are categorical; integer and
/// float columns are numeric; everything else is skipped.
pub(crate) fn infer_column_role(dtype: &DataType) -> FeatureRole {
    match get_dtype_category(dtype) {
        DtypeCategory::Numeric => FeatureRole::Numeric,
        DtypeCategory::String | DtypeCategory::Boolean => FeatureRole::Categorical,
        DtypeCategory::Datetime | DtypeCategory::Other => FeatureRole::Skipped,
    }
}
