//! Trained model wrapper for inference and serialization.
//!
//! This module provides [`TrainedModel`], which wraps a fitted
//! [`GbdtBooster`] together with the feature order and class mapping it was
//! trained with, and enables:
//!
//! - **Prediction** via [`predict()`](TrainedModel::predict),
//!   [`predict_labels()`](TrainedModel::predict_labels) and
//!   [`predict_proba()`](TrainedModel::predict_proba)
//! - **Serialization** via [`save()`](TrainedModel::save), [`load()`](TrainedModel::load),
//!   [`to_bytes()`](TrainedModel::to_bytes), and [`from_bytes()`](TrainedModel::from_bytes)
//! - **Introspection** via [`info()`](TrainedModel::info) and property accessors
//!
//! # Lifecycle
//!
//! A `TrainedModel` is created in one of three ways:
//!
//! 1. **From training**: [`Trainer::train_model()`](crate::Trainer::train_model)
//!    returns it next to the [`TrainingResult`](crate::TrainingResult)
//! 2. **From disk**: [`TrainedModel::load()`] reads a previously saved model
//! 3. **From a response**: [`TrainedModel::from_bytes()`] on the base64-decoded
//!    `artifacts.model.data`
//!
//! # Artifact Format
//!
//! The bytes are a JSON envelope:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "trained_at": "2026-01-01T00:00:00Z",
//!   "feature_names": ["age", "city"],
//!   "class_mapping": {"0": "no", "1": "yes"},
//!   "task_type": "binary_classification",
//!   "n_features": 2,
//!   "n_classes": 2,
//!   "parameters": {"max_depth": 3, "learning_rate": 0.1, "n_estimators": 100},
//!   "boosters": [{"kind": "trees", "ensemble": {}}]
//! }
//! ```
//!
//! Each `ensemble` is the boosting library's own serialized model.
//!
//! # Example
//!
//! ```rust,ignore
//! use treeline_learning::{TrainedModel, Trainer};
//!
//! let (result, model) = Trainer::new(config)?.train_model(&df)?;
//!
//! // Save for later use
//! model.save("model.json")?;
//!
//! // Later, load and predict on rows transformed by the same pipeline
//! let loaded = TrainedModel::load("model.json")?;
//! let labels = loaded.predict_labels(matrix.view())?;
//! ```

use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::backend::{Booster, BoosterState, GbdtBooster};
use crate::config::TaskType;
use crate::error::{Result, TrainingError};
use crate::types::ModelInfo;

/// Envelope version written by this crate.
pub const MODEL_FORMAT_VERSION: u32 = 1;

const MODEL_FILE_NAME: &str = "model.json";

#[derive(Serialize, Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    trained_at: DateTime<Utc>,
    feature_names: Vec<String>,
    class_mapping: Option<BTreeMap<usize, String>>,
    #[serde(flatten)]
    state: BoosterState,
}

/// A trained gradient-boosted model ready for inference.
///
/// Input matrices must be produced by the same fitted preprocessing pipeline
/// that produced the training matrix: same columns, same order, same
/// encodings. [`feature_names()`](Self::feature_names) lists that order.
///
/// # Thread Safety
///
/// `TrainedModel` is `Send`, so it can be moved into a blocking worker.
#[derive(Debug)]
pub struct TrainedModel {
    booster: GbdtBooster,
    feature_names: Vec<String>,
    class_mapping: Option<BTreeMap<usize, String>>,
    trained_at: DateTime<Utc>,
}

static_assertions::assert_impl_all!(TrainedModel: Send);

impl TrainedModel {
    /// Wrap a fitted booster.
    pub(crate) fn new(
        booster: GbdtBooster,
        feature_names: Vec<String>,
        class_mapping: Option<BTreeMap<usize, String>>,
    ) -> Self {
        Self {
            booster,
            feature_names,
            class_mapping,
            trained_at: Utc::now(),
        }
    }

    /// Load a model from a file written by [`save()`](Self::save).
    ///
    /// # Errors
    ///
    /// - [`TrainingError::ModelNotFound`] if the file doesn't exist
    /// - [`TrainingError::Serialization`] if the envelope or a booster is invalid
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TrainingError::ModelNotFound {
                path: path.display().to_string(),
            });
        }
        Self::from_bytes(&std::fs::read(path)?)
    }

    /// Save the model envelope to a file.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Io`] if the file cannot be written, or
    /// [`TrainingError::Serialization`] if a booster cannot be exported.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let envelope = ModelEnvelope {
            format_version: MODEL_FORMAT_VERSION,
            trained_at: self.trained_at,
            feature_names: self.feature_names.clone(),
            class_mapping: self.class_mapping.clone(),
            state: self.booster.to_state()?,
        };
        std::fs::write(path.as_ref(), serde_json::to_vec(&envelope)?)?;
        debug!("Saved model to {}", path.as_ref().display());
        Ok(())
    }

    /// Serialize the model to bytes.
    ///
    /// The envelope is written to a file inside a scoped temporary directory
    /// and read back; the directory is removed whether or not this succeeds.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(MODEL_FILE_NAME);
        self.save(&path)?;
        Ok(std::fs::read(&path)?)
    }

    /// Deserialize a model from bytes produced by [`to_bytes()`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Serialization`] for unknown envelope versions,
    /// a feature list that disagrees with the booster, or booster payloads the
    /// library rejects.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: ModelEnvelope = serde_json::from_slice(bytes)
            .map_err(|e| TrainingError::Serialization(format!("invalid model envelope: {e}")))?;

        if envelope.format_version != MODEL_FORMAT_VERSION {
            return Err(TrainingError::Serialization(format!(
                "unsupported model format version {} (expected {})",
                envelope.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if envelope.feature_names.len() != envelope.state.n_features {
            return Err(TrainingError::Serialization(format!(
                "envelope lists {} feature names for a {}-feature model",
                envelope.feature_names.len(),
                envelope.state.n_features
            )));
        }

        Ok(Self {
            booster: GbdtBooster::from_state(&envelope.state)?,
            feature_names: envelope.feature_names,
            class_mapping: envelope.class_mapping,
            trained_at: envelope.trained_at,
        })
    }

    /// Predict one value per row.
    ///
    /// Regression models return the predicted value; classifiers return the
    /// class index as `f64`.
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        self.booster.predict(features)
    }

    /// Predict the original class label of each row.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InferenceError`] for regression models.
    pub fn predict_labels(&self, features: ArrayView2<'_, f64>) -> Result<Vec<String>> {
        let mapping = self.class_mapping.as_ref().ok_or_else(|| {
            TrainingError::InferenceError("regression models have no class labels".to_string())
        })?;

        self.booster
            .predict(features)?
            .into_iter()
            .map(|code| {
                mapping.get(&(code as usize)).cloned().ok_or_else(|| {
                    TrainingError::InferenceError(format!("class index {code} has no label"))
                })
            })
            .collect()
    }

    /// Class probabilities, one column per class index.
    pub fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.booster.predict_proba(features)
    }

    /// Raw split-count importance per feature, aligned with [`feature_names()`](Self::feature_names).
    pub fn feature_importances(&self) -> Result<Vec<f64>> {
        self.booster.feature_importances()
    }

    /// The task this model was trained for.
    #[must_use]
    pub fn task_type(&self) -> TaskType {
        self.booster.task_type()
    }

    /// Input columns in the order the model expects.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Class index to label (`None` for regression).
    #[must_use]
    pub fn class_mapping(&self) -> Option<&BTreeMap<usize, String>> {
        self.class_mapping.as_ref()
    }

    /// Summary of the model for display or logging.
    #[must_use]
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            format_version: MODEL_FORMAT_VERSION,
            task_type: self.booster.task_type(),
            n_features: self.booster.n_features(),
            n_classes: self.booster.n_classes(),
            feature_names: self.feature_names.clone(),
            class_labels: self
                .class_mapping
                .as_ref()
                .map(|m| m.values().cloned().collect()),
            parameters: self.booster.params(),
            trained_at: self.trained_at,
        }
    }
}
