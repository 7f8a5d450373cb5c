//! Client code generation.
//!
//! Renders a standalone module that replays the fitted preprocessing on raw
//! rows, so callers can build model inputs without this crate.

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::str::FromStr;
use treeline_processing::{FeatureTransform, FillValue, PipelineMetadata, ScalingParams};

use crate::config::TaskType;
use crate::error::{Result, TrainingError};
use crate::types::TrainingResult;

const TYPESCRIPT_TEMPLATE: &str = include_str!("typescript_client.ts.tmpl");

/// Target language of a generated client module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLanguage {
    TypeScript,
}

impl FromStr for ClientLanguage {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "typescript" | "ts" => Ok(Self::TypeScript),
            other => Err(TrainingError::InvalidConfig(format!(
                "unsupported client language '{}' (expected 'typescript')",
                other
            ))),
        }
    }
}

/// Render a client module for a finished training run.
pub fn generate_client(language: ClientLanguage, result: &TrainingResult) -> Result<String> {
    match language {
        ClientLanguage::TypeScript => generate_typescript_client(
            &result.pipeline_metadata,
            result.task_type,
            result.class_mapping.as_ref(),
        ),
    }
}

/// Render the TypeScript client.
///
/// The module embeds the feature order, categorical maps, numeric scaling
/// parameters, fit-time fill values and the class mapping.
pub fn generate_typescript_client(
    metadata: &PipelineMetadata,
    task_type: TaskType,
    class_mapping: Option<&BTreeMap<usize, String>>,
) -> Result<String> {
    let mut categorical = Map::new();
    let mut scaling = Map::new();
    let mut fills = Map::new();

    for feature in &metadata.feature_metadata {
        match &feature.transform {
            FeatureTransform::Categorical { mapping } => {
                categorical.insert(feature.name.clone(), serde_json::to_value(mapping)?);
            }
            FeatureTransform::Numeric { scaling: params } => {
                scaling.insert(feature.name.clone(), scaling_literal(params));
            }
        }
        match &feature.fill_value {
            Some(FillValue::Number(n)) => {
                fills.insert(feature.name.clone(), json!(n));
            }
            Some(FillValue::Text(s)) => {
                fills.insert(feature.name.clone(), json!(s));
            }
            None => {}
        }
    }

    let source = TYPESCRIPT_TEMPLATE
        .replace("{{TASK_TYPE}}", &serde_json::to_string(task_type.as_str())?)
        .replace("{{FEATURES}}", &serde_json::to_string(&metadata.features)?)
        .replace(
            "{{CATEGORICAL_MAPS}}",
            &serde_json::to_string_pretty(&Value::Object(categorical))?,
        )
        .replace(
            "{{NUMERIC_SCALING}}",
            &serde_json::to_string_pretty(&Value::Object(scaling))?,
        )
        .replace(
            "{{FILL_VALUES}}",
            &serde_json::to_string_pretty(&Value::Object(fills))?,
        )
        .replace(
            "{{CLASS_MAPPING}}",
            &serde_json::to_string_pretty(&class_mapping)?,
        );

    Ok(source)
}

fn scaling_literal(params: &ScalingParams) -> Value {
    match *params {
        ScalingParams::Standard { mean, scale } => {
            json!({"method": "standard", "mean": mean, "scale": scale})
        }
        ScalingParams::MinMax { min, scale } => {
            json!({"method": "minmax", "min": min, "scale": scale})
        }
    }
}
