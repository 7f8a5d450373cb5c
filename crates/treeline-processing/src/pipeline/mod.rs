//! Pipeline module.
//!
//! This module provides the fit/transform feature pipeline and the
//! row-level steps it is built from.

mod builder;
mod executor;
pub mod outliers;

pub use builder::{FeaturePipeline, FeaturePipelineBuilder};
pub(crate) use executor::PreprocessingExecutor;
pub use outliers::OutlierHandler;
