//! Named feature functions derived from a model's raw output.
//!
//! Features are held in an explicit registry: a [`FeatureSet`] maps each name to
//! a function reference, in registration order. Adding a feature means
//! registering a name/function pair.

mod neuron;
mod spikes;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::model::{RawResult, Response};

pub use neuron::{
    ACCOMMODATION_INDEX, AVERAGE_AHP_DEPTH, AVERAGE_AP_OVERSHOOT, AVERAGE_AP_WIDTH, NR_SPIKES,
    SPIKE_RATE, TIME_BEFORE_FIRST_SPIKE,
};
pub use spikes::{Spike, SpikeConfig, Spikes};

/// Result of one feature on one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureOutput {
    Valid {
        time: Option<Vec<f64>>,
        response: Response,
    },
    /// The feature is undefined for this sample.
    Invalid,
}

impl FeatureOutput {
    pub fn scalar(value: f64) -> Self {
        FeatureOutput::Valid {
            time: None,
            response: Response::Scalar(value),
        }
    }

    pub fn series(time: Option<Vec<f64>>, values: Vec<f64>) -> Self {
        FeatureOutput::Valid {
            time,
            response: Response::Series(values),
        }
    }

    /// `Valid` scalar when `value` is `Some` and finite, `Invalid` otherwise.
    pub fn scalar_or_invalid(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Self::scalar(v),
            _ => FeatureOutput::Invalid,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, FeatureOutput::Valid { .. })
    }
}

pub type FeatureFn = Arc<dyn Fn(&RawResult) -> FeatureOutput + Send + Sync>;

/// Ordered registry of feature functions.
#[derive(Clone, Default)]
pub struct FeatureSet {
    features: Vec<(String, FeatureFn)>,
}

impl std::fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureSet")
            .field("features", &self.names())
            .finish()
    }
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> Result<(), ConfigurationError>
    where
        F: Fn(&RawResult) -> FeatureOutput + Send + Sync + 'static,
    {
        let name = name.into();
        if self.features.iter().any(|(n, _)| *n == name) {
            return Err(ConfigurationError::DuplicateFeature(name));
        }
        self.features.push((name, Arc::new(f)));
        Ok(())
    }

    /// Chainable form of [`FeatureSet::register`].
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&RawResult) -> FeatureOutput + Send + Sync + 'static,
    {
        self.register(name, f)?;
        Ok(self)
    }

    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|(n, _)| n == name)
    }

    pub fn evaluate(
        &self,
        name: &str,
        raw: &RawResult,
    ) -> Result<FeatureOutput, ConfigurationError> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f(raw))
            .ok_or_else(|| ConfigurationError::UnknownFeature(name.to_string()))
    }

    /// Evaluate every feature in registration order.
    pub fn evaluate_all(&self, raw: &RawResult) -> Vec<(String, FeatureOutput)> {
        self.features
            .iter()
            .map(|(name, f)| (name.clone(), f(raw)))
            .collect()
    }

    /// Keep only `names`, in the order given.
    pub fn with_only(&self, names: &[&str]) -> Result<Self, ConfigurationError> {
        let features = names
            .iter()
            .map(|name| {
                self.features
                    .iter()
                    .find(|(n, _)| n == name)
                    .cloned()
                    .ok_or_else(|| ConfigurationError::UnknownFeature(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { features })
    }

    /// Set over statically named features.
    ///
    /// # Panics
    ///
    /// If two entries share a name.
    pub(crate) fn from_static(entries: Vec<(&'static str, FeatureFn)>) -> Self {
        for (i, (name, _)) in entries.iter().enumerate() {
            assert!(
                entries[..i].iter().all(|(other, _)| other != name),
                "feature `{name}` listed twice"
            );
        }
        Self {
            features: entries
                .into_iter()
                .map(|(name, f)| (name.to_string(), f))
                .collect(),
        }
    }

    /// Built-in spike features for voltage traces.
    pub fn spike_features(config: SpikeConfig) -> Self {
        neuron::spike_feature_set(config)
    }
}
