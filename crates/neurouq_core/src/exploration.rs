//! Repeated propagation over a list of scenarios for comparative studies.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{RunConfig, RunContext, RunControl};
use crate::data::UncertaintyData;
use crate::distribution::Distribution;
use crate::error::{ConfigurationError, StorageError, UqError};
use crate::features::FeatureSet;
use crate::model::Model;
use crate::parameters::ParameterSet;
use crate::sampling::Scheme;
use crate::storage;
use crate::uncertainty::propagate;

/// How [`interval_scenarios`] rebuilds each distribution from a nominal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    /// `U(value - interval / 2, value + interval / 2)`
    Uniform,
    /// `N(value, interval * value)`
    Normal,
}

impl IntervalKind {
    pub fn around(self, value: f64, interval: f64) -> Result<Distribution, ConfigurationError> {
        match self {
            IntervalKind::Uniform => Distribution::uniform_around(value, interval),
            IntervalKind::Normal => Distribution::normal_around(value, interval),
        }
    }

    fn label(self) -> &'static str {
        match self {
            IntervalKind::Uniform => "uniform",
            IntervalKind::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub parameters: ParameterSet,
    pub scheme: Scheme,
    /// Replaces the exploration's run configuration for this scenario.
    pub config: Option<RunConfig>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, parameters: ParameterSet, scheme: Scheme) -> Self {
        Self {
            name: name.into(),
            parameters,
            scheme,
            config: None,
        }
    }
}

#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: Result<UncertaintyData, UqError>,
}

/// Each uncertain parameter on its own, the others fixed at their nominal value.
pub fn single_parameter_scenarios(
    parameters: &ParameterSet,
    scheme: &Scheme,
) -> Result<Vec<Scenario>, ConfigurationError> {
    let uncertain = parameters.uncertain_names();
    if uncertain.is_empty() {
        return Err(ConfigurationError::NoUncertainParameters);
    }

    uncertain
        .iter()
        .map(|keep| {
            let mut single = parameters.clone();
            for other in uncertain.iter().filter(|n| *n != keep) {
                single.fix(other)?;
            }
            Ok(Scenario::new(
                format!("single_parameter_{keep}"),
                single,
                scheme.clone(),
            ))
        })
        .collect()
}

/// Every parameter made uncertain around its nominal value, once per interval.
pub fn interval_scenarios(
    parameters: &ParameterSet,
    intervals: &[f64],
    kind: IntervalKind,
    scheme: &Scheme,
) -> Result<Vec<Scenario>, ConfigurationError> {
    intervals
        .iter()
        .map(|&interval| {
            let mut widened = parameters.clone();
            widened.set_all_distributions(|value| kind.around(value, interval))?;
            Ok(Scenario::new(
                format!("{}_{interval}", kind.label()),
                widened,
                scheme.clone(),
            ))
        })
        .collect()
}

/// Monte Carlo at several sample counts.
pub fn sample_count_scenarios(
    parameters: &ParameterSet,
    counts: &[usize],
) -> Result<Vec<Scenario>, ConfigurationError> {
    counts
        .iter()
        .map(|&count| {
            let scheme = Scheme::monte_carlo(count);
            scheme.validate()?;
            Ok(Scenario::new(format!("mc_{count}"), parameters.clone(), scheme))
        })
        .collect()
}

/// Ordered scenarios sharing one model, feature set and base configuration.
#[derive(Debug, Clone, Default)]
pub struct Exploration {
    pub scenarios: Vec<Scenario>,
    pub config: RunConfig,
}

impl Exploration {
    pub fn new(config: RunConfig) -> Self {
        Self {
            scenarios: Vec::new(),
            config,
        }
    }

    pub fn push(&mut self, scenario: Scenario) {
        self.scenarios.push(scenario);
    }

    pub fn extend(&mut self, scenarios: impl IntoIterator<Item = Scenario>) {
        self.scenarios.extend(scenarios);
    }

    /// Run every scenario in order. A failed scenario does not stop the rest;
    /// cancelling `control` makes every remaining scenario report
    /// [`UqError::Cancelled`].
    pub fn run<M: Model + ?Sized>(
        &self,
        model: &M,
        features: &FeatureSet,
        control: &RunControl,
    ) -> Vec<ScenarioOutcome> {
        self.scenarios
            .iter()
            .enumerate()
            .map(|(i, scenario)| {
                tracing::info!(
                    scenario = %scenario.name,
                    index = i + 1,
                    total = self.scenarios.len(),
                    "starting scenario"
                );
                let result = if control.is_cancelled() {
                    Err(UqError::Cancelled)
                } else {
                    let config = scenario.config.clone().unwrap_or_else(|| self.config.clone());
                    let ctx = RunContext::new(scenario.name.clone(), config)
                        .with_control(control.clone());
                    propagate(model, features, &scenario.parameters, &scenario.scheme, &ctx)
                };
                if let Err(error) = &result {
                    tracing::warn!(scenario = %scenario.name, %error, "scenario failed");
                }
                ScenarioOutcome {
                    name: scenario.name.clone(),
                    result,
                }
            })
            .collect()
    }
}

/// Save each successful outcome as `<dir>/<scenario>.json`.
pub fn save_outcomes(outcomes: &[ScenarioOutcome], dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut written = Vec::new();
    for outcome in outcomes {
        if let Ok(data) = &outcome.result {
            let path = storage::path_for(dir, &outcome.name);
            storage::save(data, &path)?;
            written.push(path);
        }
    }
    Ok(written)
}
