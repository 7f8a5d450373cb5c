//! [`Booster`] over the `gbdt` crate.
//!
//! Regression fits one squared-error ensemble. Binary classification fits one
//! log-likelihood ensemble for class 1. Multiclass fits one log-likelihood
//! ensemble per class (one-vs-rest) and normalises the per-class
//! probabilities of each row to sum to one.
//!
//! A class that is absent from, or covers all of, the training labels cannot
//! be fitted as a binary problem; it becomes a constant member predicting
//! 0 or 1.

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::debug;

use super::Booster;
use crate::config::{BoostingParams, TaskType};
use crate::error::{Result, TrainingError};
use crate::metrics::argmax_rows;

const SQUARED_ERROR: &str = "SquaredError";
const LOG_LIKELIHOOD: &str = "LogLikelyhood";

/// Serializable form of a [`GbdtBooster`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterState {
    pub task_type: TaskType,
    pub n_features: usize,
    /// `None` for regression.
    pub n_classes: Option<usize>,
    pub parameters: BoostingParams,
    /// One entry per ensemble, in class order for multiclass.
    pub boosters: Vec<BoosterArtifact>,
}

/// One serialized ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoosterArtifact {
    /// A fitted tree ensemble in the library's own JSON format.
    Trees { ensemble: Value },
    /// A class that was always or never present in the training labels.
    Constant { probability: f64 },
}

enum Member {
    Trees(GBDT),
    Constant(f64),
}

/// Gradient-boosted trees backed by the `gbdt` crate.
pub struct GbdtBooster {
    task_type: TaskType,
    params: BoostingParams,
    n_features: usize,
    n_classes: Option<usize>,
    members: Vec<Member>,
}

impl fmt::Debug for GbdtBooster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GbdtBooster")
            .field("task_type", &self.task_type)
            .field("params", &self.params)
            .field("n_features", &self.n_features)
            .field("n_classes", &self.n_classes)
            .field("members", &self.members.len())
            .finish()
    }
}

impl GbdtBooster {
    /// An unfitted booster.
    ///
    /// `n_classes` is required for classification and ignored for regression.
    pub fn new(
        task_type: TaskType,
        params: BoostingParams,
        n_features: usize,
        n_classes: Option<usize>,
    ) -> Result<Self> {
        let n_classes = match (task_type, n_classes) {
            (TaskType::Regression, _) => None,
            (_, Some(n)) if n >= 2 => Some(n),
            (_, other) => {
                return Err(TrainingError::InvalidConfig(format!(
                    "{} needs at least two classes, got {:?}",
                    task_type, other
                )));
            }
        };
        if n_features == 0 {
            return Err(TrainingError::InvalidData(
                "at least one feature column is required".to_string(),
            ));
        }

        Ok(Self {
            task_type,
            params,
            n_features,
            n_classes,
            members: Vec::new(),
        })
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn params(&self) -> BoostingParams {
        self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> Option<usize> {
        self.n_classes
    }

    pub fn is_fitted(&self) -> bool {
        !self.members.is_empty()
    }

    fn expected_members(&self) -> usize {
        match self.task_type {
            TaskType::Regression | TaskType::BinaryClassification => 1,
            TaskType::MulticlassClassification => self.n_classes.unwrap_or(0),
        }
    }

    fn library_config(&self, loss: &str) -> Config {
        let mut cfg = Config::new();
        cfg.set_feature_size(self.n_features);
        cfg.set_max_depth(self.params.max_depth);
        cfg.set_iterations(self.params.n_estimators as usize);
        cfg.set_shrinkage(self.params.learning_rate as f32);
        cfg.set_loss(loss);
        cfg
    }

    fn check_width(&self, features: &ArrayView2<'_, f64>) -> Result<()> {
        if features.ncols() != self.n_features {
            return Err(TrainingError::InferenceError(format!(
                "expected {} feature columns, got {}",
                self.n_features,
                features.ncols()
            )));
        }
        if !self.is_fitted() {
            return Err(TrainingError::InferenceError(
                "model has not been fitted".to_string(),
            ));
        }
        Ok(())
    }

    fn fit_member(&self, rows: &[Vec<f32>], labels: Vec<f32>, loss: &str) -> Member {
        if loss == LOG_LIKELIHOOD {
            if labels.iter().all(|y| *y > 0.0) {
                return Member::Constant(1.0);
            }
            if labels.iter().all(|y| *y < 0.0) {
                return Member::Constant(0.0);
            }
        }

        let mut data: DataVec = rows
            .iter()
            .zip(labels)
            .map(|(row, label)| Data::new_training_data(row.clone(), 1.0, label, None))
            .collect();

        let mut model = GBDT::new(&self.library_config(loss));
        model.fit(&mut data);
        Member::Trees(model)
    }

    /// Per-member output: regression values or class-membership probabilities.
    fn member_output(member: &Member, rows: &DataVec) -> Vec<f64> {
        match member {
            Member::Trees(model) => model.predict(rows).into_iter().map(f64::from).collect(),
            Member::Constant(p) => vec![*p; rows.len()],
        }
    }

    /// Export the fitted ensembles through the library's own file format.
    pub fn to_state(&self) -> Result<BoosterState> {
        let dir = tempfile::tempdir()?;
        let boosters = self
            .members
            .iter()
            .enumerate()
            .map(|(index, member)| match member {
                Member::Trees(model) => {
                    let path = dir.path().join(format!("booster-{index}.json"));
                    model
                        .save_model(path_str(&path)?)
                        .map_err(|e| TrainingError::Serialization(e.to_string()))?;
                    let text = std::fs::read_to_string(&path)?;
                    Ok(BoosterArtifact::Trees {
                        ensemble: serde_json::from_str(&text)?,
                    })
                }
                Member::Constant(probability) => Ok(BoosterArtifact::Constant {
                    probability: *probability,
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BoosterState {
            task_type: self.task_type,
            n_features: self.n_features,
            n_classes: self.n_classes,
            parameters: self.params,
            boosters,
        })
    }

    /// Rebuild a booster from [`to_state`](Self::to_state) output.
    pub fn from_state(state: &BoosterState) -> Result<Self> {
        let mut booster = Self::new(
            state.task_type,
            state.parameters,
            state.n_features,
            state.n_classes,
        )
        .map_err(|e| TrainingError::Serialization(e.to_string()))?;

        if state.boosters.len() != booster.expected_members() {
            return Err(TrainingError::Serialization(format!(
                "{} model needs {} ensembles, found {}",
                state.task_type,
                booster.expected_members(),
                state.boosters.len()
            )));
        }

        let dir = tempfile::tempdir()?;
        booster.members = state
            .boosters
            .iter()
            .enumerate()
            .map(|(index, artifact)| match artifact {
                BoosterArtifact::Trees { ensemble } => {
                    let path = dir.path().join(format!("booster-{index}.json"));
                    std::fs::write(&path, serde_json::to_vec(ensemble)?)?;
                    let model = GBDT::load_model(path_str(&path)?)
                        .map_err(|e| TrainingError::Serialization(e.to_string()))?;
                    Ok(Member::Trees(model))
                }
                BoosterArtifact::Constant { probability } => Ok(Member::Constant(*probability)),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(booster)
    }
}

impl Booster for GbdtBooster {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[f64]) -> Result<()> {
        if features.ncols() != self.n_features {
            return Err(TrainingError::InvalidData(format!(
                "expected {} feature columns, got {}",
                self.n_features,
                features.ncols()
            )));
        }
        if features.nrows() != labels.len() {
            return Err(TrainingError::InvalidData(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if labels.is_empty() {
            return Err(TrainingError::InvalidData(
                "cannot fit on zero rows".to_string(),
            ));
        }

        let rows = to_rows(&features);
        let members = match (self.task_type, self.n_classes) {
            (TaskType::Regression, _) => {
                let targets = labels.iter().map(|y| *y as f32).collect();
                vec![self.fit_member(&rows, targets, SQUARED_ERROR)]
            }
            (TaskType::BinaryClassification, _) => {
                vec![self.fit_member(&rows, one_vs_rest(labels, 1), LOG_LIKELIHOOD)]
            }
            (TaskType::MulticlassClassification, Some(n_classes)) => (0..n_classes)
                .map(|class| {
                    debug!("Fitting one-vs-rest ensemble for class {}", class);
                    self.fit_member(&rows, one_vs_rest(labels, class), LOG_LIKELIHOOD)
                })
                .collect(),
            (TaskType::MulticlassClassification, None) => {
                return Err(TrainingError::TrainingFailed(
                    "multiclass booster has no class count".to_string(),
                ));
            }
        };

        debug!(
            "Fitted {} ensemble(s) of {} trees on {} rows",
            members.len(),
            self.params.n_estimators,
            rows.len()
        );
        self.members = members;
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        if self.task_type == TaskType::Regression {
            self.check_width(&features)?;
            let rows = to_test_data(&features);
            return Ok(Self::member_output(&self.members[0], &rows));
        }

        let proba = self.predict_proba(features)?;
        Ok(argmax_rows(&proba).into_iter().map(|c| c as f64).collect())
    }

    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let n_classes = self.n_classes.ok_or_else(|| {
            TrainingError::InferenceError(
                "class probabilities are only available for classification models".to_string(),
            )
        })?;
        self.check_width(&features)?;

        let rows = to_test_data(&features);
        let n_rows = rows.len();
        let mut proba = Array2::<f64>::zeros((n_rows, n_classes));

        if self.task_type == TaskType::BinaryClassification {
            for (i, p) in Self::member_output(&self.members[0], &rows)
                .into_iter()
                .enumerate()
            {
                let p = p.clamp(0.0, 1.0);
                proba[[i, 0]] = 1.0 - p;
                proba[[i, 1]] = p;
            }
            return Ok(proba);
        }

        for (class, member) in self.members.iter().enumerate() {
            for (i, p) in Self::member_output(member, &rows).into_iter().enumerate() {
                proba[[i, class]] = p.clamp(0.0, 1.0);
            }
        }
        for mut row in proba.rows_mut() {
            let total: f64 = row.sum();
            if total > 0.0 {
                row.mapv_inplace(|p| p / total);
            } else {
                row.fill(1.0 / n_classes as f64);
            }
        }
        Ok(proba)
    }

    fn feature_importances(&self) -> Result<Vec<f64>> {
        let mut counts = vec![0.0; self.n_features];
        for artifact in self.to_state()?.boosters {
            if let BoosterArtifact::Trees { ensemble } = artifact {
                count_splits(&ensemble, &mut counts);
            }
        }
        Ok(counts)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let state = self.to_state()?;
        std::fs::write(path, serde_json::to_vec(&state)?)?;
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TrainingError::ModelNotFound {
                path: path.display().to_string(),
            });
        }
        let state: BoosterState = serde_json::from_slice(&std::fs::read(path)?)?;
        Self::from_state(&state)
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        TrainingError::Serialization(format!("non UTF-8 path {}", path.display()))
    })
}

fn to_rows(features: &ArrayView2<'_, f64>) -> Vec<Vec<f32>> {
    features
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| *v as f32).collect())
        .collect()
}

fn to_test_data(features: &ArrayView2<'_, f64>) -> DataVec {
    to_rows(features)
        .into_iter()
        .map(|row| Data::new_test_data(row, None))
        .collect()
}

/// `+1` for rows of `class`, `-1` for every other row.
fn one_vs_rest(labels: &[f64], class: usize) -> Vec<f32> {
    labels
        .iter()
        .map(|y| if *y as usize == class { 1.0 } else { -1.0 })
        .collect()
}

/// Count internal tree nodes per split feature.
fn count_splits(value: &Value, counts: &mut [f64]) {
    match value {
        Value::Object(map) => {
            let is_split = map.get("is_leaf").and_then(Value::as_bool) == Some(false);
            if is_split {
                if let Some(slot) = map
                    .get("feature_index")
                    .and_then(Value::as_u64)
                    .and_then(|i| counts.get_mut(i as usize))
                {
                    *slot += 1.0;
                }
            }
            for child in map.values() {
                count_splits(child, counts);
            }
        }
        Value::Array(items) => {
            for item in items {
                count_splits(item, counts);
            }
        }
        _ => {}
    }
}
