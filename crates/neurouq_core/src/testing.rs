//! Small deterministic models and features for exercising the pipeline.
//!
//! The models read parameters `a` and `b` (defaults 1 and 2) and produce a
//! response of the requested dimensionality over a 10-point time axis.

use crate::error::SimulationError;
use std::sync::Arc;

use crate::features::{FeatureFn, FeatureOutput, FeatureSet};
use crate::model::{Model, RawResult, Response};
use crate::parameters::Sample;

pub const POINTS: usize = 10;

fn axis() -> Vec<f64> {
    (0..POINTS).map(|i| i as f64).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestingModel {
    dimension: usize,
    with_time: bool,
    name: &'static str,
}

impl TestingModel {
    /// Scalar `a + b`.
    pub fn zero_d() -> Self {
        Self {
            dimension: 0,
            with_time: true,
            name: "testing_model_0d",
        }
    }

    /// Series `t + a + b` for `t = 0..10`.
    pub fn one_d() -> Self {
        Self {
            dimension: 1,
            with_time: true,
            name: "testing_model_1d",
        }
    }

    /// Rows `[t + a, t + b]` for `t = 0..10`, shape `[10, 2]`.
    pub fn two_d() -> Self {
        Self {
            dimension: 2,
            with_time: true,
            name: "testing_model_2d",
        }
    }

    pub fn without_time(mut self) -> Self {
        self.with_time = false;
        self
    }
}

impl Model for TestingModel {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, sample: &Sample) -> Result<RawResult, SimulationError> {
        let a = sample.get_or("a", 1.0);
        let b = sample.get_or("b", 2.0);
        let t = axis();

        let response = match self.dimension {
            0 => Response::Scalar(a + b),
            1 => Response::Series(t.iter().map(|ti| ti + a + b).collect()),
            _ => Response::from_rows(t.iter().map(|ti| vec![ti + a, ti + b]).collect())?,
        };
        let time = match (self.with_time, self.dimension) {
            (false, _) => None,
            (true, 0) => Some(vec![1.0]),
            (true, _) => Some(t),
        };
        RawResult::new(time, response)
    }
}

pub type SamplePredicate = Box<dyn Fn(&Sample) -> bool + Send + Sync>;

/// Wraps a model and fails every sample matching a predicate.
pub struct FailingModel<M, P = SamplePredicate> {
    inner: M,
    predicate: P,
}

impl<M, P> FailingModel<M, P>
where
    M: Model,
    P: Fn(&Sample) -> bool + Send + Sync,
{
    pub fn new(inner: M, predicate: P) -> Self {
        Self { inner, predicate }
    }
}

impl<M: Model> FailingModel<M> {
    /// Fail on exactly the samples at `indices` of `samples`, matched by value.
    pub fn at_indices(inner: M, samples: &[Sample], indices: &[usize]) -> Self {
        let targets: Vec<Vec<(String, f64)>> = indices
            .iter()
            .filter_map(|&i| samples.get(i))
            .map(|s| s.values.clone())
            .collect();
        Self::new(inner, Box::new(move |s: &Sample| targets.contains(&s.values)))
    }
}

impl<M, P> Model for FailingModel<M, P>
where
    M: Model,
    P: Fn(&Sample) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn run(&self, sample: &Sample) -> Result<RawResult, SimulationError> {
        if (self.predicate)(sample) {
            return Err(SimulationError::Failed {
                model: self.inner.name().to_string(),
                reason: "injected failure".to_string(),
            });
        }
        self.inner.run(sample)
    }

    fn adaptive(&self) -> bool {
        self.inner.adaptive()
    }
}

pub const FEATURE_0D: &str = "feature0d";
pub const FEATURE_1D: &str = "feature1d";
pub const FEATURE_2D: &str = "feature2d";
pub const FEATURE_INVALID: &str = "feature_invalid";

/// Features whose outputs ignore the model result entirely.
pub fn testing_features() -> FeatureSet {
    let two_d: FeatureFn = Arc::new(|_: &RawResult| {
        match Response::from_rows(vec![axis(), axis()]) {
            Ok(response) => FeatureOutput::Valid {
                time: None,
                response,
            },
            Err(_) => FeatureOutput::Invalid,
        }
    });
    let zero_d: FeatureFn = Arc::new(|_: &RawResult| FeatureOutput::scalar(1.0));
    let one_d: FeatureFn = Arc::new(|_: &RawResult| FeatureOutput::series(None, axis()));
    let invalid: FeatureFn = Arc::new(|_: &RawResult| FeatureOutput::Invalid);
    FeatureSet::from_static(vec![
        (FEATURE_0D, zero_d),
        (FEATURE_1D, one_d),
        (FEATURE_2D, two_d),
        (FEATURE_INVALID, invalid),
    ])
}
