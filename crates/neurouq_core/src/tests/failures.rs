//! Tests for per-sample model failures
//!
//! These tests verify that:
//! - A failing sample is excluded from every quantity
//! - Excluded counts are recorded in the ensemble and in the statistics
//! - The run as a whole still succeeds
//! - Statistics refuse a sample set that does not belong to the ensemble

use crate::config::{RunConfig, RunContext};
use crate::distribution::Distribution;
use crate::error::{ConfigurationError, UqError};
use crate::evaluate::DIRECT_COMPARISON;
use crate::parameters::{Parameter, ParameterSet};
use crate::sampling::{Scheme, generate_samples};
use crate::simulation;
use crate::testing::{
    FEATURE_0D, FEATURE_1D, FEATURE_2D, FEATURE_INVALID, FailingModel, TestingModel,
    testing_features,
};
use crate::uncertainty::compute;

fn parameters() -> ParameterSet {
    ParameterSet::new()
        .with(Parameter::uncertain("a", 1.0, Distribution::uniform(0.5, 1.5).unwrap()))
        .unwrap()
        .with(Parameter::uncertain("b", 2.0, Distribution::uniform(1.5, 2.5).unwrap()))
        .unwrap()
}

#[test]
fn test_two_of_twenty_samples_fail() {
    let parameters = parameters();
    let scheme = Scheme::monte_carlo(20);
    let ctx = RunContext::new("failures", RunConfig::default());
    let samples = generate_samples(&parameters, &scheme, ctx.config.seed).unwrap();
    let model = FailingModel::at_indices(TestingModel::one_d(), &samples.samples, &[3, 11]);
    let features = testing_features()
        .with_only(&[FEATURE_0D, FEATURE_1D, FEATURE_2D])
        .unwrap();

    let ensemble = simulation::run(&model, &features, &samples.samples, &ctx).unwrap();

    assert_eq!(ensemble.sample_count, 20);
    assert_eq!(ensemble.quantities.len(), 4);
    for quantity in &ensemble.quantities {
        assert_eq!(quantity.len(), 18, "{}", quantity.name);
        assert_eq!(quantity.excluded, vec![3, 11], "{}", quantity.name);
    }
    let failed: Vec<usize> = ensemble.failed_samples.iter().map(|(i, _)| *i).collect();
    assert_eq!(failed, vec![3, 11]);

    let data = compute(&ensemble, &parameters, &samples, &scheme, &ctx).unwrap();
    assert_eq!(data.failed_samples, 2);
    for (name, stats) in &data.quantities {
        assert_eq!(stats.excluded, 2, "{name}");
        assert_eq!(stats.evaluated, 18, "{name}");
    }
}

#[test]
fn test_invalid_feature_counts_every_sample_as_excluded() {
    let parameters = parameters();
    let scheme = Scheme::monte_carlo(10);
    let ctx = RunContext::new("invalid_feature", RunConfig::default());
    let samples = generate_samples(&parameters, &scheme, ctx.config.seed).unwrap();

    let ensemble =
        simulation::run(&TestingModel::zero_d(), &testing_features(), &samples.samples, &ctx)
            .unwrap();

    assert!(ensemble.get(FEATURE_INVALID).is_none());
    assert_eq!(ensemble.failures.len(), 1);
    assert_eq!(ensemble.failures[0].quantity(), FEATURE_INVALID);
    assert_eq!(ensemble.get(DIRECT_COMPARISON).unwrap().len(), 10);

    let data = compute(&ensemble, &parameters, &samples, &scheme, &ctx).unwrap();
    assert_eq!(data.failures.len(), 1);
    assert_eq!(data.failures[0].quantity, FEATURE_INVALID);
    assert!(data.get(FEATURE_INVALID).is_err());
}

#[test]
fn test_every_sample_failing_still_returns_data() {
    let parameters = parameters();
    let scheme = Scheme::polynomial_chaos(1);
    let ctx = RunContext::new("all_fail", RunConfig::default());
    let samples = generate_samples(&parameters, &scheme, ctx.config.seed).unwrap();
    let model = FailingModel::new(TestingModel::zero_d(), |_: &crate::parameters::Sample| true);

    let ensemble = simulation::run(&model, &testing_features(), &samples.samples, &ctx).unwrap();
    assert!(ensemble.quantities.is_empty());
    assert_eq!(ensemble.failures.len(), 5);

    let data = compute(&ensemble, &parameters, &samples, &scheme, &ctx).unwrap();
    assert!(data.quantities.is_empty());
    assert_eq!(data.failed_samples, 4);
}

#[test]
fn test_sample_set_from_another_run_rejected() {
    let parameters = parameters();
    let scheme = Scheme::monte_carlo(10);
    let ctx = RunContext::new("mismatch", RunConfig::default());
    let samples = generate_samples(&parameters, &scheme, ctx.config.seed).unwrap();
    let ensemble =
        simulation::run(&TestingModel::zero_d(), &testing_features(), &samples.samples, &ctx)
            .unwrap();

    let larger = generate_samples(&parameters, &Scheme::monte_carlo(12), ctx.config.seed).unwrap();
    assert!(matches!(
        compute(&ensemble, &parameters, &larger, &scheme, &ctx),
        Err(UqError::Configuration(ConfigurationError::InvalidScheme(_)))
    ));
}

#[test]
fn test_layout_must_match_scheme() {
    let parameters = parameters();
    let ctx = RunContext::new("layout", RunConfig::default());
    let plain = Scheme::monte_carlo(10);
    let samples = generate_samples(&parameters, &plain, ctx.config.seed).unwrap();
    let ensemble =
        simulation::run(&TestingModel::zero_d(), &testing_features(), &samples.samples, &ctx)
            .unwrap();

    assert!(compute(&ensemble, &parameters, &samples, &plain, &ctx).is_ok());
    for scheme in [Scheme::monte_carlo_sobol(10), Scheme::polynomial_chaos(1)] {
        assert!(
            matches!(
                compute(&ensemble, &parameters, &samples, &scheme, &ctx),
                Err(UqError::Configuration(ConfigurationError::InvalidScheme(_)))
            ),
            "{}",
            scheme.label()
        );
    }
}
