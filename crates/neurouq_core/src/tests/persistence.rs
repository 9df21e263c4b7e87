//! Tests for saving and loading computed results
//!
//! These tests verify that:
//! - A computed result survives a save/load cycle unchanged
//! - Loaded data is flagged as loaded and keeps its classification
//! - Views behave the same on loaded data
//! - Files whose arrays disagree with their shape are rejected

use tempfile::TempDir;

use crate::config::{RunConfig, RunContext};
use crate::data::{DataOrigin, Statistic};
use crate::distribution::Distribution;
use crate::error::{StorageError, UqError};
use crate::evaluate::DIRECT_COMPARISON;
use crate::parameters::{Parameter, ParameterSet};
use crate::sampling::Scheme;
use crate::storage;
use crate::testing::{FEATURE_0D, FEATURE_1D, FEATURE_2D, TestingModel, testing_features};
use crate::uncertainty::propagate;

fn computed() -> crate::data::UncertaintyData {
    let parameters = ParameterSet::new()
        .with(Parameter::uncertain("a", 1.0, Distribution::uniform(0.5, 1.5).unwrap()))
        .unwrap()
        .with(Parameter::uncertain("b", 2.0, Distribution::normal(2.0, 0.2).unwrap()))
        .unwrap();
    let features = testing_features()
        .with_only(&[FEATURE_0D, FEATURE_1D, FEATURE_2D])
        .unwrap();
    let ctx = RunContext::new("persisted run", RunConfig::default());
    propagate(
        &TestingModel::one_d(),
        &features,
        &parameters,
        &Scheme::polynomial_chaos(2),
        &ctx,
    )
    .unwrap()
}

#[test]
fn test_save_load_preserves_statistics() {
    let dir = TempDir::new().unwrap();
    let data = computed();
    let path = storage::path_for(dir.path(), &data.name);
    assert_eq!(path.file_name().unwrap(), "persisted_run.json");

    storage::save(&data, &path).unwrap();
    let loaded = storage::load(&path).unwrap();

    assert_eq!(data.origin, DataOrigin::Computed);
    assert_eq!(loaded.origin, DataOrigin::Loaded);
    assert_eq!(loaded.name, data.name);
    assert_eq!(loaded.scheme, data.scheme);
    assert_eq!(loaded.quantities, data.quantities);
    assert_eq!(loaded.features_0d, data.features_0d);
    assert_eq!(loaded.features_1d, data.features_1d);
    assert_eq!(loaded.sample_count, data.sample_count);
}

#[test]
fn test_loaded_views_match_computed_views() {
    let dir = TempDir::new().unwrap();
    let data = computed();
    let path = dir.path().join("run.json");
    storage::save(&data, &path).unwrap();
    let loaded = storage::load(&path).unwrap();

    assert_eq!(loaded.features_0d, vec![FEATURE_0D]);
    assert_eq!(loaded.features_1d, vec![DIRECT_COMPARISON, FEATURE_1D]);

    for statistic in Statistic::ALL {
        assert_eq!(
            loaded.series(DIRECT_COMPARISON, statistic).unwrap(),
            data.series(DIRECT_COMPARISON, statistic).unwrap()
        );
    }
    assert_eq!(
        loaded.sensitivity(DIRECT_COMPARISON).unwrap(),
        data.sensitivity(DIRECT_COMPARISON).unwrap()
    );
    assert!(matches!(
        loaded.series(FEATURE_2D, Statistic::Mean),
        Err(UqError::UnsupportedDimensionality(_))
    ));
}

#[test]
fn test_corrupt_file_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corrupt.json");
    std::fs::write(&path, "{ \"name\": ").unwrap();
    assert!(matches!(storage::load(&path), Err(StorageError::Parse(_))));
}

#[test]
fn test_truncated_statistics_rejected_on_load() {
    let data = computed();
    let mut value: serde_json::Value =
        serde_json::from_str(&storage::to_json(&data).unwrap()).unwrap();
    value["quantities"][FEATURE_0D]["mean"] = serde_json::json!([]);

    let result = storage::from_json(&value.to_string());
    assert!(matches!(
        result,
        Err(StorageError::ShapeMismatch { ref quantity, field: "mean", expected: 1, actual: 0 })
            if quantity == FEATURE_0D
    ));
}

#[test]
fn test_missing_sensitivity_row_rejected_on_load() {
    let data = computed();
    let mut value: serde_json::Value =
        serde_json::from_str(&storage::to_json(&data).unwrap()).unwrap();
    let rows = value["quantities"][DIRECT_COMPARISON]["sensitivity"]
        .as_array_mut()
        .unwrap();
    rows.pop();

    assert!(matches!(
        storage::from_json(&value.to_string()),
        Err(StorageError::ShapeMismatch { field: "sensitivity rows", expected: 2, actual: 1, .. })
    ));
}
