//! Shared utilities for the feature preprocessing pipeline.
//!
//! Dtype classification, typed column extraction and Series statistics
//! the pipeline needs beyond what polars provides directly.

use polars::prelude::*;

use crate::error::{PreprocessingError, Result};

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for preprocessing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Date or datetime types
    Datetime,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time | DataType::Duration(_)
    )
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if is_datetime_dtype(dtype) {
        DtypeCategory::Datetime
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

// =============================================================================
// Column Extraction
// =============================================================================

/// Read a column as a nullable `Float64` Series.
///
/// Numeric and boolean columns are cast, with NaN treated as null. String
/// columns are parsed strictly after trimming; blank strings are null and any
/// other value that does not parse as a number fails the whole column.
pub fn numeric_series(series: &Series) -> Result<Series> {
    let name = series.name().clone();
    match get_dtype_category(series.dtype()) {
        DtypeCategory::Numeric | DtypeCategory::Boolean => {
            let cast = series.cast(&DataType::Float64)?;
            let ca = cast.f64()?;
            Ok(ca.set(&ca.is_nan(), None)?.into_series())
        }
        DtypeCategory::String => {
            let cast = series.cast(&DataType::String)?;
            let parsed = cast
                .str()?
                .into_iter()
                .map(|v| match v.map(str::trim) {
                    None | Some("") => Ok(None),
                    Some(s) => s.parse::<f64>().map(Some).map_err(|_| {
                        PreprocessingError::TypeConversionFailed {
                            column: name.to_string(),
                            target_type: "numeric".to_string(),
                            reason: format!("value '{}' is not a number", s),
                        }
                    }),
                })
                .collect::<Result<Float64Chunked>>()?;
            Ok(parsed.with_name(name).into_series())
        }
        DtypeCategory::Datetime | DtypeCategory::Other => {
            Err(PreprocessingError::TypeConversionFailed {
                column: name.to_string(),
                target_type: "numeric".to_string(),
                reason: format!("unsupported dtype {}", series.dtype()),
            })
        }
    }
}

/// [`numeric_series`] collected into plain values.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    Ok(numeric_series(series)?.f64()?.into_iter().collect())
}

/// Read a column as a nullable `String` Series.
///
/// Every dtype polars can cast to `String` is accepted, so numeric-looking
/// categoricals keep their textual form (`1`, `2.5`, `true`).
pub fn string_series(series: &Series) -> Result<Series> {
    Ok(series.cast(&DataType::String)?)
}

/// [`string_series`] collected into plain values.
pub fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    Ok(string_series(series)?
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// The most frequent non-null values of a Series, sorted ascending.
///
/// Empty when the Series holds no non-null value. More than one value means
/// a tie; callers take the first to prefer the smallest.
pub fn mode_values(series: &Series) -> Result<Series> {
    let non_null = series.drop_nulls().with_name("value".into());
    if non_null.is_empty() {
        return Ok(non_null);
    }

    let counts_df = non_null.value_counts(false, false, "count".into(), false)?;
    let counts = counts_df
        .column("count")?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;
    let counts = counts.u64()?;
    let Some(top) = counts.max() else {
        return Ok(non_null.clear());
    };

    let values = counts_df.column("value")?.as_materialized_series();
    Ok(values
        .filter(&counts.equal(top))?
        .sort(SortOptions::default())?)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_dtype_category() {
        assert_eq!(get_dtype_category(&DataType::Int64), DtypeCategory::Numeric);
        assert_eq!(get_dtype_category(&DataType::Date), DtypeCategory::Datetime);
        assert_eq!(
            get_dtype_category(&DataType::Boolean),
            DtypeCategory::Boolean
        );
        assert_eq!(get_dtype_category(&DataType::String), DtypeCategory::String);
        assert_eq!(
            get_dtype_category(&DataType::List(Box::new(DataType::Int64))),
            DtypeCategory::Other
        );
    }

    #[test]
    fn test_numeric_values_from_ints_and_strings() {
        let ints = Series::new("a".into(), &[Some(1i64), None, Some(3)]);
        assert_eq!(numeric_values(&ints).unwrap(), vec![Some(1.0), None, Some(3.0)]);

        let strings = Series::new("b".into(), &[Some("1.5"), Some(" "), None]);
        assert_eq!(numeric_values(&strings).unwrap(), vec![Some(1.5), None, None]);
    }

    #[test]
    fn test_numeric_values_rejects_text() {
        let strings = Series::new("b".into(), &["1", "abc"]);
        let err = numeric_values(&strings).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
    }

    #[test]
    fn test_string_values_from_numbers() {
        let ints = Series::new("a".into(), &[Some(1i64), None, Some(20)]);
        assert_eq!(
            string_values(&ints).unwrap(),
            vec![Some("1".to_string()), None, Some("20".to_string())]
        );
    }

    #[test]
    fn test_numeric_values_rejects_formatted_numbers() {
        for text in ["1,5", "50%", "$12"] {
            let strings = Series::new("b".into(), &["1", text]);
            let err = numeric_values(&strings).unwrap_err();
            assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
            assert!(err.to_string().contains(text));
        }
    }

    #[test]
    fn test_numeric_values_trims_and_treats_nan_as_null() {
        let strings = Series::new("b".into(), &[" 2.5 ", "-1e3"]);
        assert_eq!(
            numeric_values(&strings).unwrap(),
            vec![Some(2.5), Some(-1000.0)]
        );

        let floats = Series::new("f".into(), &[1.0, f64::NAN]);
        assert_eq!(numeric_values(&floats).unwrap(), vec![Some(1.0), None]);
    }

    #[test]
    fn test_mode_values_sorted_on_ties() {
        let numbers = Series::new(
            "n".into(),
            &[Some(3.0), Some(1.0), None, Some(3.0), Some(1.0), Some(2.0)],
        );
        let modes = mode_values(&numbers).unwrap();
        assert_eq!(
            modes.f64().unwrap().into_no_null_iter().collect::<Vec<_>>(),
            vec![1.0, 3.0]
        );

        let strings = Series::new("count".into(), &["b", "a", "b"]);
        let modes = mode_values(&strings).unwrap();
        assert_eq!(modes.str().unwrap().get(0), Some("b"));
        assert_eq!(modes.len(), 1);
    }

    #[test]
    fn test_mode_values_all_null_is_empty() {
        let nulls = Series::new("n".into(), &[Option::<f64>::None, None]);
        assert!(mode_values(&nulls).unwrap().is_empty());
    }
}
