//! Numeric scaling with per-column fitted parameters.

use polars::prelude::*;
use std::collections::BTreeMap;

use crate::config::ScalingMethod;
use crate::error::{PreprocessingError, Result};
use crate::types::ScalingParams;

/// One scaler shared by all numeric features, holding parameters per column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericScaler {
    method: ScalingMethod,
    params: BTreeMap<String, ScalingParams>,
}

impl NumericScaler {
    /// Fit parameters for every `Float64` column, keyed by Series name.
    ///
    /// Fails with [`PreprocessingError::NoValidValues`] on a column with no
    /// non-null value.
    pub fn fit<'a, I>(method: ScalingMethod, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Series>,
    {
        let mut params = BTreeMap::new();
        for series in columns {
            let fitted = Self::fit_column(method, series)?
                .ok_or_else(|| PreprocessingError::NoValidValues(series.name().to_string()))?;
            params.insert(series.name().to_string(), fitted);
        }
        Ok(Self { method, params })
    }

    fn fit_column(method: ScalingMethod, series: &Series) -> Result<Option<ScalingParams>> {
        Ok(match method {
            ScalingMethod::Standard => {
                match (series.mean(), series.std(0)) {
                    (Some(mean), Some(std)) => {
                        let scale = if std == 0.0 { 1.0 } else { std };
                        Some(ScalingParams::Standard { mean, scale })
                    }
                    _ => None,
                }
            }
            ScalingMethod::MinMax => {
                match (series.min::<f64>()?, series.max::<f64>()?) {
                    (Some(min), Some(max)) => {
                        let range = max - min;
                        let scale = if range == 0.0 { 1.0 } else { 1.0 / range };
                        Some(ScalingParams::MinMax {
                            min: -min * scale,
                            scale,
                        })
                    }
                    _ => None,
                }
            }
        })
    }

    pub fn method(&self) -> ScalingMethod {
        self.method
    }

    pub fn params(&self, column: &str) -> Option<&ScalingParams> {
        self.params.get(column)
    }

    /// Scale a `Float64` Series with the parameters fitted for its name.
    pub fn transform_column(&self, series: &Series) -> Result<Series> {
        let params = self
            .params
            .get(series.name().as_str())
            .ok_or_else(|| PreprocessingError::ColumnNotFound(series.name().to_string()))?;
        Ok(series
            .f64()?
            .apply_values(|v| params.apply(v))
            .into_series())
    }
}
