//! Integration tests for the feature preprocessing pipeline.
//!
//! These tests drive fit/transform end to end on fixture datasets.

use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use treeline_processing::{
    DataPipelineConfig, DataProfiler, FeaturePipeline, FeatureTransform, MissingValueStrategy,
    PipelineMetadata, PreprocessingError, PreprocessingOptions, ScalingMethod, ScalingParams,
    read_frame_from_path,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    read_frame_from_path(fixtures_path().join(filename)).expect("Failed to read CSV file")
}

fn customers_config(scaling: ScalingMethod) -> DataPipelineConfig {
    DataPipelineConfig::builder()
        .features(["age", "city", "income", "member"])
        .categorical_features(["city", "member"])
        .numeric_features(["age", "income"])
        .scaling_method(scaling)
        .build()
        .unwrap()
}

fn column(matrix: &ndarray::Array2<f64>, idx: usize) -> Vec<f64> {
    matrix.column(idx).to_vec()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

// ============================================================================
// Scaling
// ============================================================================

#[test]
fn test_standard_scaling_centers_numeric_columns() {
    let df = load_csv("customers.csv");
    let mut pipeline = FeaturePipeline::new(customers_config(ScalingMethod::Standard));
    let out = pipeline.fit_transform(&df).unwrap();

    assert_eq!(out.feature_names, vec!["age", "city", "income", "member"]);
    assert_eq!(out.n_rows(), 10);

    for idx in [0, 2] {
        let values = column(&out.matrix, idx);
        assert!(mean(&values).abs() < 1e-9, "column {idx} mean");
        assert!((population_std(&values) - 1.0).abs() < 1e-9, "column {idx} std");
    }
}

#[test]
fn test_minmax_scaling_spans_unit_interval() {
    let df = load_csv("customers.csv");
    let mut pipeline = FeaturePipeline::new(customers_config(ScalingMethod::MinMax));
    let out = pipeline.fit_transform(&df).unwrap();

    for idx in [0, 2] {
        let values = column(&out.matrix, idx);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(min.abs() < 1e-9);
        assert!((max - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_categorical_codes_follow_sorted_classes() {
    let df = load_csv("customers.csv");
    let mut pipeline = FeaturePipeline::new(customers_config(ScalingMethod::Standard));
    let out = pipeline.fit_transform(&df).unwrap();

    // city: berlin=0, paris=1, rome=2; the null in row 7 takes the mode
    // (three-way tie between all cities, smallest wins)
    assert_eq!(
        column(&out.matrix, 1),
        vec![1.0, 2.0, 1.0, 0.0, 2.0, 0.0, 1.0, 0.0, 2.0, 0.0]
    );
    // member: false=0, true=1
    assert_eq!(
        column(&out.matrix, 3),
        vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]
    );
}

// ============================================================================
// Missing Values
// ============================================================================

fn single_column_pipeline(strategy: MissingValueStrategy) -> FeaturePipeline {
    FeaturePipeline::new(
        DataPipelineConfig::builder()
            .numeric_features(["x"])
            .handle_missing(strategy)
            .build()
            .unwrap(),
    )
}

#[test]
fn test_mean_fill_of_one_null_three() {
    let df = df!["x" => [Some(1.0), None, Some(3.0)]].unwrap();
    let mut pipeline = single_column_pipeline(MissingValueStrategy::Mean);
    pipeline.fit(&df).unwrap();

    let metadata = pipeline.export_metadata().unwrap();
    assert_eq!(
        metadata.scaling_params("x"),
        Some(&ScalingParams::Standard {
            mean: 2.0,
            scale: (2.0f64 / 3.0).sqrt()
        })
    );
}

#[test]
fn test_median_fill_of_one_null_three() {
    let df = df!["x" => [Some(1.0), None, Some(3.0)]].unwrap();
    let mut pipeline = single_column_pipeline(MissingValueStrategy::Median);
    let out = pipeline.fit_transform(&df).unwrap();
    // the filled value sits exactly on the mean, so it scales to zero
    assert_eq!(out.matrix[[1, 0]], 0.0);
}

#[test]
fn test_drop_of_one_null_three() {
    let df = df![
        "x" => [Some(1.0), None, Some(3.0)],
        "target" => [0, 1, 0],
    ]
    .unwrap();
    let mut pipeline = single_column_pipeline(MissingValueStrategy::Drop);
    let out = pipeline.fit_transform(&df).unwrap();

    assert_eq!(out.n_rows(), 2);
    assert_eq!(out.row_indices, vec![0, 2]);
}

// ============================================================================
// Outliers
// ============================================================================

#[test]
fn test_outlier_replaced_with_pre_replacement_mean() {
    let df = load_csv("sensor_readings.csv");
    let config = DataPipelineConfig::builder()
        .features(["reading", "site"])
        .categorical_features(["site"])
        .numeric_features(["reading"])
        .build()
        .unwrap();

    let mut pipeline = FeaturePipeline::new(config);
    let out = pipeline.fit_transform(&df).unwrap();
    assert_eq!(out.n_rows(), 20);

    // 1000 becomes 59.5; the scaler is fitted on the replaced column
    let metadata = pipeline.export_metadata().unwrap();
    match metadata.scaling_params("reading") {
        Some(ScalingParams::Standard { mean, .. }) => assert!((mean - 12.475).abs() < 1e-9),
        other => panic!("unexpected scaling params: {other:?}"),
    }
}

#[test]
fn test_outlier_handling_can_be_disabled() {
    let df = load_csv("sensor_readings.csv");
    let config = DataPipelineConfig::builder()
        .numeric_features(["reading"])
        .handle_outliers(false)
        .build()
        .unwrap();

    let mut pipeline = FeaturePipeline::new(config);
    pipeline.fit(&df).unwrap();
    let metadata = pipeline.export_metadata().unwrap();
    match metadata.scaling_params("reading") {
        Some(ScalingParams::Standard { mean, .. }) => assert!((mean - 59.5).abs() < 1e-9),
        other => panic!("unexpected scaling params: {other:?}"),
    }
}

#[test]
fn test_transform_recomputes_outlier_statistics_on_its_own_frame() {
    let train = df!["x" => (0..=100).map(f64::from).collect::<Vec<_>>()].unwrap();
    let mut test_values: Vec<f64> = (1..=19).map(f64::from).collect();
    test_values.push(1000.0);
    let test = df!["x" => test_values].unwrap();

    let config = DataPipelineConfig::builder()
        .numeric_features(["x"])
        .scaling_method(ScalingMethod::MinMax)
        .build()
        .unwrap();
    let mut pipeline = FeaturePipeline::new(config);
    pipeline.fit(&train).unwrap();

    // 1000 is an outlier within the transform frame only: replaced by that
    // frame's mean 59.5, then scaled with the fit range [0, 100].
    let out = pipeline.transform(&test).unwrap();
    let scaled = column(&out.matrix, 0);
    assert_eq!(scaled.len(), 20);
    assert!((scaled[19] - 0.595).abs() < 1e-12, "got {}", scaled[19]);
    assert!((scaled[0] - 0.01).abs() < 1e-12);
}

// ============================================================================
// Metadata
// ============================================================================

/// Replays numeric scaling and categorical codes from exported metadata.
fn replay(metadata: &PipelineMetadata, df: &DataFrame) -> Vec<Vec<f64>> {
    (0..df.height())
        .map(|row| {
            metadata
                .features
                .iter()
                .map(|name| {
                    let value = df.column(name).unwrap().get(row).unwrap();
                    match &metadata.feature(name).unwrap().transform {
                        FeatureTransform::Categorical { mapping } => {
                            let key = value.str_value().to_string();
                            f64::from(*mapping.get(&key).unwrap_or(&0))
                        }
                        FeatureTransform::Numeric { scaling } => {
                            scaling.apply(value.try_extract::<f64>().unwrap())
                        }
                    }
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_exported_metadata_reproduces_transform() {
    let train = load_csv("customers.csv");
    let mut pipeline = FeaturePipeline::new(customers_config(ScalingMethod::Standard));
    pipeline.fit(&train).unwrap();

    let json = pipeline.export_metadata_json().unwrap();
    let metadata: PipelineMetadata = serde_json::from_str(&json).unwrap();
    assert_eq!(metadata, pipeline.export_metadata().unwrap());

    let fresh = df![
        "age" => [30i64, 44, 51],
        "city" => ["rome", "madrid", "paris"],
        "income" => [41000i64, 45000, 50000],
        "member" => [false, true, true],
    ]
    .unwrap();

    let out = pipeline.transform(&fresh).unwrap();
    let expected = replay(&metadata, &fresh);
    for (row, values) in expected.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            assert!(
                (out.matrix[[row, col]] - value).abs() < 1e-12,
                "row {row} col {col}"
            );
        }
    }
    // madrid was never seen
    assert_eq!(out.matrix[[1, 1]], 0.0);
}

#[test]
fn test_metadata_lists_every_category() {
    let df = load_csv("customers.csv");
    let mut pipeline = FeaturePipeline::new(customers_config(ScalingMethod::MinMax));
    pipeline.fit(&df).unwrap();
    let metadata = pipeline.export_metadata().unwrap();

    let cities: Vec<&String> = metadata.categorical_mapping("city").unwrap().keys().collect();
    assert_eq!(cities, vec!["berlin", "paris", "rome"]);
    assert_eq!(metadata.scaling_method, ScalingMethod::MinMax);
    assert_eq!(metadata.features.len(), 4);
}

// ============================================================================
// Roles and Errors
// ============================================================================

#[test]
fn test_inferred_roles_on_fixture() {
    let df = load_csv("customers.csv").drop("churned").unwrap();
    let config = DataProfiler::infer_feature_roles(&df)
        .into_config(PreprocessingOptions::default())
        .unwrap();

    assert_eq!(config.features, vec!["age", "city", "income", "member"]);
    assert_eq!(config.categorical_features, vec!["city", "member"]);
    assert_eq!(config.numeric_features, vec!["age", "income"]);
}

#[test]
fn test_missing_declared_feature() {
    let df = load_csv("customers.csv").drop("income").unwrap();
    let mut pipeline = FeaturePipeline::new(customers_config(ScalingMethod::Standard));
    let err = pipeline.fit(&df).unwrap_err();

    assert!(matches!(&err, PreprocessingError::MissingFeatures(cols) if cols == &["income"]));
    assert!(err.is_user_error());
}

#[test]
fn test_formatted_numbers_in_numeric_feature_are_rejected() {
    for text in ["1,5", "50%"] {
        let df = df!["x" => ["1", "2", text]].unwrap();
        let config = DataPipelineConfig::builder()
            .numeric_features(["x"])
            .build()
            .unwrap();
        let mut pipeline = FeaturePipeline::new(config);
        let err = pipeline.fit(&df).unwrap_err();

        assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
        assert!(err.to_string().contains(text));
    }
}
