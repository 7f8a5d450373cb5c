//! Outlier handling module.
//!
//! Z-score replacement for numeric columns. Statistics come from the Series
//! passed in, so fit and transform each see their own frame.

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;

/// Handles outlier detection and treatment.
pub struct OutlierHandler;

impl OutlierHandler {
    /// Replace values of a `Float64` column whose z-score magnitude exceeds
    /// `threshold` with the column mean.
    ///
    /// The z-score uses the sample standard deviation, and the mean is taken
    /// before any value is replaced. Columns with fewer than two values or
    /// zero deviation are left untouched. Returns the treated Series and the
    /// number of replacements.
    pub fn replace_zscore_outliers(series: &Series, threshold: f64) -> Result<(Series, usize)> {
        let (Some(mean), Some(std)) = (series.mean(), series.std(1)) else {
            return Ok((series.clone(), 0));
        };
        if std == 0.0 || !std.is_finite() {
            return Ok((series.clone(), 0));
        }

        let ca = series.f64()?;
        let outliers: BooleanChunked = ca
            .into_iter()
            .map(|v| v.map(|x| ((x - mean) / std).abs() > threshold))
            .collect();
        let replaced = outliers.num_trues();
        if replaced == 0 {
            return Ok((series.clone(), 0));
        }

        debug!(
            "Replaced {} outliers in '{}' with mean {:.4} (|z| > {})",
            replaced,
            series.name(),
            mean,
            threshold
        );
        Ok((ca.set(&outliers, Some(mean))?.into_series(), replaced))
    }
}
