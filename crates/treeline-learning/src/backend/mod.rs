//! Boosting library boundary.
//!
//! The trainer and [`TrainedModel`](crate::TrainedModel) talk to the tree
//! ensemble only through [`Booster`]. [`GbdtBooster`] implements it over the
//! `gbdt` crate.

mod gbdt_backend;

use ndarray::{Array2, ArrayView2};
use std::path::Path;

use crate::error::Result;

pub use gbdt_backend::{BoosterArtifact, BoosterState, GbdtBooster};

/// A gradient-boosted tree model.
///
/// Feature matrices are dense, one row per sample, with columns in the order
/// the model was fitted on. Class labels are indices `0..n_classes` stored as
/// `f64`.
pub trait Booster: Send {
    /// Fit on `features` and `labels`, replacing any previous fit.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidData`](crate::TrainingError::InvalidData)
    /// for shape mismatches and
    /// [`TrainingError::TrainingFailed`](crate::TrainingError::TrainingFailed)
    /// when the library rejects the data.
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[f64]) -> Result<()>;

    /// Predict one value per row: the regression output, or the most likely
    /// class index.
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>>;

    /// Class probabilities, one row per sample and one column per class.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InferenceError`](crate::TrainingError::InferenceError)
    /// for regression models.
    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    /// Raw importance per feature column, in column order.
    fn feature_importances(&self) -> Result<Vec<f64>>;

    /// Write the fitted model to `path`.
    fn save(&self, path: &Path) -> Result<()>;

    /// Read a model written by [`save`](Self::save).
    fn load(path: &Path) -> Result<Self>
    where
        Self: Sized;
}
