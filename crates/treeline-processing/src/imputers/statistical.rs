//! Statistical imputation methods.
//!
//! Provides mean, median and mode fill values computed by polars and fills
//! the nulls of a typed feature Series with them.

use polars::prelude::*;

use crate::config::MissingValueStrategy;
use crate::error::Result;
use crate::utils::mode_values;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Compute the fill value for a `Float64` column.
    ///
    /// Returns `None` when the column has no non-null value, or when the
    /// strategy is [`MissingValueStrategy::Drop`]. Mode ties pick the
    /// smallest value.
    pub fn numeric_fill_value(
        series: &Series,
        strategy: MissingValueStrategy,
    ) -> Result<Option<f64>> {
        Ok(match strategy {
            MissingValueStrategy::Mean => series.mean(),
            MissingValueStrategy::Median => series.median(),
            MissingValueStrategy::Mode => mode_values(series)?.f64()?.first(),
            MissingValueStrategy::Drop => None,
        })
    }

    /// Compute the mode of a `String` column; ties pick the
    /// lexicographically smallest value.
    pub fn categorical_fill_value(series: &Series) -> Result<Option<String>> {
        let modes = mode_values(series)?;
        Ok(modes.str()?.first().map(str::to_string))
    }

    /// Replace every null of a `Float64` column with `fill`.
    ///
    /// Returns the filled Series and the number of values filled.
    pub fn fill_numeric(series: &Series, fill: f64) -> Result<(Series, usize)> {
        let ca = series.f64()?;
        let filled = ca.fill_null_with_values(fill)?;
        Ok((filled.into_series(), ca.null_count()))
    }

    /// Replace every null of a `String` column with `fill`.
    ///
    /// Returns the filled Series and the number of values filled.
    pub fn fill_categorical(series: &Series, fill: &str) -> Result<(Series, usize)> {
        let ca = series.str()?;
        let filled = ca.set(&ca.is_null(), Some(fill))?;
        Ok((filled.into_series(), ca.null_count()))
    }
}
