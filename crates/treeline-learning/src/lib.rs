//! treeline-learning: gradient-boosted tree training over a fitted
//! preprocessing pipeline.
//!
//! This crate turns a raw tabular frame and a [`TrainConfig`] into a trained
//! tree ensemble, evaluation metrics, and the artifacts a client needs to use
//! the model elsewhere: the serialized model, the exported preprocessing
//! metadata, and optionally a generated client module.
//!
//! # Features
//!
//! - **Three task types**: binary classification, multiclass classification
//!   and regression
//! - **Automatic feature roles**: categorical/numeric roles inferred from
//!   column dtypes, or an explicit pipeline configuration
//! - **Target encoding**: label encoding with a recorded class mapping
//! - **Reproducible splits**: seeded train/test partitioning
//! - **Self-describing artifacts**: a versioned JSON model envelope
//! - **Client generation**: a TypeScript module replaying the preprocessing
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use treeline_learning::{TaskType, TrainConfig, TrainedModel, Trainer};
//! use treeline_processing::read_frame_from_path;
//!
//! let df = read_frame_from_path("customers.csv")?;
//!
//! // Configure the run
//! let config = TrainConfig::builder()
//!     .target_column("churned")
//!     .task_type(TaskType::BinaryClassification)
//!     .max_depth(4)
//!     .random_seed(42)
//!     .build()?;
//!
//! // Train
//! let (result, model) = Trainer::new(config)?.train_model(&df)?;
//! println!("features: {:?}", result.feature_names);
//! println!("importance: {:?}", result.feature_importance);
//!
//! // Keep the model around
//! model.save("churn.json")?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Trainer                              │
//! │                                                                  │
//! │  DataFrame ──► FeaturePipeline ──► matrix ──┐                    │
//! │      │                                      ├──► GbdtBooster     │
//! │      └──────► target encoding ──► labels ───┘        │           │
//! │                                                      ▼           │
//! │             TrainingResult ◄── metrics, importances, envelope    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The preprocessing lives in `treeline-processing`; the boosting library is
//! reached only through the [`Booster`] trait.
//!
//! # Error Handling
//!
//! All operations return [`TrainingError`]. Use
//! [`is_user_error()`](TrainingError::is_user_error) to tell bad requests from
//! internal failures:
//!
//! ```rust,ignore
//! match Trainer::new(config)?.train(&df) {
//!     Ok(result) => println!("{:?}", result.metrics),
//!     Err(e) if e.is_user_error() => eprintln!("fix the request: {e}"),
//!     Err(e) => eprintln!("training failed: {e}"),
//! }
//! ```
//!
//! # Model Persistence
//!
//! Models can be saved to disk or serialized to bytes:
//!
//! ```rust,ignore
//! model.save("model.json")?;
//! let model = TrainedModel::load("model.json")?;
//!
//! let bytes = model.to_bytes()?;
//! let model = TrainedModel::from_bytes(&bytes)?;
//! ```
//!
//! # Modules
//!
//! - [`backend`] - The boosting library boundary
//! - [`codegen`] - Generated client modules
//! - [`metrics`] - Evaluation metrics and importance normalisation

pub mod backend;
pub mod codegen;
mod config;
mod error;
pub mod metrics;
mod model;
mod split;
mod target;
mod trainer;
mod types;

// Re-export public API
//
// Configuration types
pub use config::{BoostingParams, TaskType, TrainConfig, TrainConfigBuilder};
// Error types
pub use error::{Result, TrainingError};
// Boosting
pub use backend::{Booster, GbdtBooster};
// Client generation
pub use codegen::{ClientLanguage, generate_client, generate_typescript_client};
// Model types
pub use model::{MODEL_FORMAT_VERSION, TrainedModel};
// Orchestration
pub use trainer::{Trainer, train};
// Result and metrics types
pub use types::{
    Artifacts, ClassificationMetrics, ConfusionMatrix, Metrics, ModelArtifact, ModelInfo,
    RegressionMetrics, TestPredictions, TrainingResult,
};
