//! Data profiling module.
//!
//! Decides which frame columns become categorical or numeric features when
//! no explicit pipeline configuration is given.

mod role_inference;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{ConfigValidationError, DataPipelineConfig, PreprocessingOptions};

pub use role_inference::FeatureRole;
pub(crate) use role_inference::infer_column_role;

/// Result of role inference over a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureRoles {
    /// Every used column, in frame order.
    pub features: Vec<String>,
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
    /// Columns left out because of their dtype.
    pub skipped: Vec<String>,
}

impl FeatureRoles {
    /// Turn the inferred roles into a validated pipeline configuration.
    pub fn into_config(
        self,
        options: PreprocessingOptions,
    ) -> Result<DataPipelineConfig, ConfigValidationError> {
        DataPipelineConfig::from_roles(self.features, self.categorical, self.numeric, options)
    }
}

/// Data profiler for analyzing dataset structure.
pub struct DataProfiler;

impl DataProfiler {
    /// Infer a role for every column of `df`, in frame order.
    ///
    /// Columns whose dtype cannot be encoded are skipped with a warning.
    pub fn infer_feature_roles(df: &DataFrame) -> FeatureRoles {
        let mut roles = FeatureRoles::default();

        for column in df.get_columns() {
            let name = column.name().to_string();
            match infer_column_role(column.dtype()) {
                FeatureRole::Numeric => {
                    roles.features.push(name.clone());
                    roles.numeric.push(name);
                }
                FeatureRole::Categorical => {
                    roles.features.push(name.clone());
                    roles.categorical.push(name);
                }
                FeatureRole::Skipped => {
                    warn!(
                        "Skipping column '{}': dtype {} is not supported as a feature",
                        name,
                        column.dtype()
                    );
                    roles.skipped.push(name);
                }
            }
        }

        debug!(
            "Inferred {} categorical and {} numeric features ({} skipped)",
            roles.categorical.len(),
            roles.numeric.len(),
            roles.skipped.len()
        );
        roles
    }
}
