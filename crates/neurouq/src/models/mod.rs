//! Concrete models the command line can propagate.

mod coffee_cup;
mod izhikevich;

pub use coffee_cup::{CoffeeCup, KAPPA, U_ENV};
pub use izhikevich::Izhikevich;

use neurouq_core::{ConfigurationError, FeatureSet, Model, ParameterSet, SpikeConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    Izhikevich,
    CoffeeCup,
}

impl ModelKind {
    pub fn build(self) -> Box<dyn Model> {
        match self {
            ModelKind::Izhikevich => Box::new(Izhikevich::default()),
            ModelKind::CoffeeCup => Box::new(CoffeeCup::default()),
        }
    }

    /// Nominal values and default uncertainty of the model's parameters.
    pub fn parameters(self) -> Result<ParameterSet, ConfigurationError> {
        match self {
            ModelKind::Izhikevich => Izhikevich::parameters(),
            ModelKind::CoffeeCup => CoffeeCup::parameters(),
        }
    }

    /// Spike features for voltage traces, none for the temperature curve.
    pub fn features(self) -> FeatureSet {
        match self {
            ModelKind::Izhikevich => FeatureSet::spike_features(SpikeConfig::default()),
            ModelKind::CoffeeCup => FeatureSet::new(),
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Izhikevich => write!(f, "izhikevich"),
            ModelKind::CoffeeCup => write!(f, "coffee-cup"),
        }
    }
}
