//! Imputation module for handling missing values.
//!
//! Statistical imputation (mean, median, mode) over typed polars Series.

mod statistical;

pub use statistical::StatisticalImputer;
