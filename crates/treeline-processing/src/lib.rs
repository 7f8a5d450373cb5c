//! Feature Preprocessing Library
//!
//! Stateful fit/transform preprocessing for tabular data, built on Polars.
//!
//! # Overview
//!
//! - **Feature Pipeline**: fits categorical encoders and a per-column numeric
//!   scaler on a training frame and replays them on any frame
//! - **Missing Values**: mean, median or mode imputation, or row dropping
//! - **Outliers**: z-score replacement with the column mean
//! - **Metadata Export**: a serializable description of the fitted transform,
//!   enough to rebuild it outside this process
//! - **Role Inference**: categorical/numeric roles from column dtypes
//! - **Loading**: CSV and Parquet frames from bytes or files
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use treeline_processing::{DataPipelineConfig, FeaturePipeline, ScalingMethod};
//! use treeline_processing::io::read_frame_from_path;
//!
//! let df = read_frame_from_path("customers.csv")?;
//!
//! let config = DataPipelineConfig::builder()
//!     .features(["age", "city", "income"])
//!     .categorical_features(["city"])
//!     .numeric_features(["age", "income"])
//!     .scaling_method(ScalingMethod::MinMax)
//!     .build()?;
//!
//! let mut pipeline = FeaturePipeline::new(config);
//! let transformed = pipeline.fit_transform(&df)?;
//!
//! println!("{} rows x {} features", transformed.n_rows(), transformed.n_features());
//! println!("{}", pipeline.export_metadata_json()?);
//! ```
//!
//! # Inferred Roles
//!
//! When no explicit configuration exists, [`DataProfiler`] derives one from
//! column dtypes:
//!
//! ```rust,ignore
//! use treeline_processing::{DataProfiler, PreprocessingOptions};
//!
//! let config = DataProfiler::infer_feature_roles(&features)
//!     .into_config(PreprocessingOptions::default())?;
//! ```

pub mod config;
pub mod encoders;
pub mod error;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod profiler;
pub mod scalers;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, DataPipelineConfig, DataPipelineConfigBuilder, MissingValueStrategy,
    PreprocessingOptions, ScalingMethod,
};
pub use encoders::LabelEncoder;
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use io::{FrameFormat, read_frame_from_bytes, read_frame_from_path};
pub use pipeline::{FeaturePipeline, FeaturePipelineBuilder, OutlierHandler};
pub use profiler::{DataProfiler, FeatureRole, FeatureRoles};
pub use scalers::NumericScaler;
pub use types::{
    FeatureDtype, FeatureMetadata, FeatureTransform, FillValue, PipelineMetadata, ScalingParams,
    TransformedFrame,
};
pub use utils::{DtypeCategory, get_dtype_category, is_numeric_dtype};
