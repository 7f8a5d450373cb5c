//! Preprocessing executor module.
//!
//! Pulls the declared feature columns out of a polars frame and runs the
//! row-level steps shared by fit and transform: missing-value handling and
//! outlier replacement.

use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::{DataPipelineConfig, MissingValueStrategy};
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::imputers::StatisticalImputer;
use crate::pipeline::outliers::OutlierHandler;
use crate::types::FillValue;
use crate::utils::{numeric_series, string_series};

/// Temporary column tracking source rows through `drop_nulls`.
const ROW_INDEX_COLUMN: &str = "__treeline_row_index";

/// Feature columns extracted from a frame, in configured feature order.
///
/// Numeric features are `Float64`, categorical features are `String`.
#[derive(Debug, Clone)]
pub(crate) struct FeatureFrame {
    pub(crate) frame: DataFrame,
    /// Source row index of every retained row.
    pub(crate) row_indices: Vec<usize>,
}

impl FeatureFrame {
    pub(crate) fn n_rows(&self) -> usize {
        self.row_indices.len()
    }

    /// The column named `name` as a Series.
    pub(crate) fn series(&self, name: &str) -> Result<&Series> {
        Ok(self.frame.column(name)?.as_materialized_series())
    }
}

/// Executes the row-level preprocessing steps.
pub struct PreprocessingExecutor;

impl PreprocessingExecutor {
    /// Extract every declared feature from `df`.
    ///
    /// Fails with [`PreprocessingError::MissingFeatures`] naming every
    /// declared feature the frame lacks.
    pub(crate) fn extract(df: &DataFrame, config: &DataPipelineConfig) -> Result<FeatureFrame> {
        let present: Vec<&str> = df
            .get_column_names()
            .into_iter()
            .map(|n| n.as_str())
            .collect();
        let missing: Vec<String> = config
            .features
            .iter()
            .filter(|f| !present.contains(&f.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PreprocessingError::MissingFeatures(missing));
        }

        let mut columns = Vec::with_capacity(config.features.len());
        for name in &config.features {
            let series = df
                .column(name)
                .context(format!("Reading feature '{}'", name))?
                .as_materialized_series();
            let typed = if config.is_categorical(name) {
                string_series(series)?
            } else {
                numeric_series(series)?
            };
            columns.push(typed.into_column());
        }

        Ok(FeatureFrame {
            frame: DataFrame::new(columns)?,
            row_indices: (0..df.height()).collect(),
        })
    }

    /// Remove every row holding a null in any of `features`. Returns rows
    /// removed.
    pub(crate) fn drop_incomplete_rows(
        frame: &mut FeatureFrame,
        features: &[String],
    ) -> Result<usize> {
        let before = frame.n_rows();
        let kept = frame
            .frame
            .with_row_index(ROW_INDEX_COLUMN.into(), None)?
            .drop_nulls(Some(features))?;

        let removed = before - kept.height();
        if removed == 0 {
            return Ok(0);
        }

        let positions = kept
            .column(ROW_INDEX_COLUMN)?
            .as_materialized_series()
            .cast(&DataType::UInt64)?;
        frame.row_indices = positions
            .u64()?
            .into_no_null_iter()
            .map(|pos| frame.row_indices[pos as usize])
            .collect();
        frame.frame = kept.drop(ROW_INDEX_COLUMN)?;

        info!("Dropped {} rows with missing feature values", removed);
        Ok(removed)
    }

    /// Fill nulls in place and return the fill value computed for each
    /// column on this frame.
    ///
    /// Numeric columns use `strategy`; categorical columns always use the
    /// mode. When a column has no non-null value the entry in `fallbacks`
    /// is used instead; without one the column fails with
    /// [`PreprocessingError::NoValidValues`].
    pub(crate) fn impute(
        frame: &mut FeatureFrame,
        strategy: MissingValueStrategy,
        fallbacks: Option<&HashMap<String, FillValue>>,
    ) -> Result<HashMap<String, FillValue>> {
        let mut fill_values = HashMap::new();

        for name in frame.frame.get_column_names_owned() {
            let name = name.to_string();
            let series = frame.series(&name)?;
            let fallback = fallbacks.and_then(|f| f.get(&name));

            let filled = if series.dtype() == &DataType::String {
                let computed = StatisticalImputer::categorical_fill_value(series)?;
                if let Some(fill) = &computed {
                    fill_values.insert(name.clone(), FillValue::Text(fill.clone()));
                }
                let fill = computed.or(match fallback {
                    Some(FillValue::Text(s)) => Some(s.clone()),
                    _ => None,
                });
                match fill {
                    Some(fill) => {
                        let (filled, count) =
                            StatisticalImputer::fill_categorical(series, &fill)?;
                        if count > 0 {
                            debug!("Filled {} nulls in '{}' with mode '{}'", count, name, fill);
                        }
                        filled
                    }
                    None => series.clone(),
                }
            } else {
                let computed = StatisticalImputer::numeric_fill_value(series, strategy)?;
                if let Some(fill) = computed {
                    fill_values.insert(name.clone(), FillValue::Number(fill));
                }
                let fill = computed.or(match fallback {
                    Some(FillValue::Number(n)) => Some(*n),
                    _ => None,
                });
                match fill {
                    Some(fill) => {
                        let (filled, count) = StatisticalImputer::fill_numeric(series, fill)?;
                        if count > 0 {
                            debug!(
                                "Filled {} nulls in '{}' with {} {:.4}",
                                count,
                                name,
                                strategy.as_str(),
                                fill
                            );
                        }
                        filled
                    }
                    None => series.clone(),
                }
            };

            if filled.null_count() > 0 {
                return Err(PreprocessingError::NoValidValues(name));
            }
            frame.frame.replace(&name, filled)?;
        }

        Ok(fill_values)
    }

    /// Z-score outlier replacement on every numeric column.
    pub(crate) fn replace_outliers(frame: &mut FeatureFrame, threshold: f64) -> Result<usize> {
        let mut total = 0;
        for name in frame.frame.get_column_names_owned() {
            let series = frame.series(name.as_str())?;
            if series.dtype() != &DataType::Float64 {
                continue;
            }
            let (treated, replaced) = OutlierHandler::replace_zscore_outliers(series, threshold)?;
            if replaced > 0 {
                frame.frame.replace(name.as_str(), treated)?;
                total += replaced;
            }
        }
        Ok(total)
    }
}
