//! Named model parameters, fixed or uncertain.

use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::ConfigurationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Nominal value, used whenever the parameter is fixed.
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,
}

impl Parameter {
    pub fn fixed(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            distribution: None,
        }
    }

    pub fn uncertain(name: impl Into<String>, value: f64, distribution: Distribution) -> Self {
        Self {
            name: name.into(),
            value,
            distribution: Some(distribution),
        }
    }

    pub fn is_uncertain(&self) -> bool {
        self.distribution.is_some()
    }
}

/// Space in which node coordinates are expressed when realizing a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateSpace {
    /// Standard polynomial-chaos germ (quadrature nodes).
    Germ,
    /// Unit hypercube, mapped through each inverse CDF.
    Probability,
    /// Already in parameter value space (Monte-Carlo draws).
    Value,
}

/// One concrete parameter vector, ordered like its [`ParameterSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub values: Vec<(String, f64)>,
    /// Quadrature weight, `1/N` for plain Monte Carlo.
    pub weight: f64,
}

impl Sample {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Value of `name`, or `default` when the parameter is absent.
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }
}

/// Ordered parameter collection with unique names.
///
/// Insertion order is the canonical parameter order: node coordinates and
/// sensitivity indices are indexed by [`ParameterSet::uncertain_names`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Parameter>", into = "Vec<Parameter>")]
pub struct ParameterSet {
    parameters: Vec<Parameter>,
}

impl TryFrom<Vec<Parameter>> for ParameterSet {
    type Error = ConfigurationError;

    fn try_from(parameters: Vec<Parameter>) -> Result<Self, Self::Error> {
        let mut set = ParameterSet::new();
        for parameter in parameters {
            set.add(parameter)?;
        }
        Ok(set)
    }
}

impl From<ParameterSet> for Vec<Parameter> {
    fn from(set: ParameterSet) -> Self {
        set.parameters
    }
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parameter: Parameter) -> Result<(), ConfigurationError> {
        if self.parameters.iter().any(|p| p.name == parameter.name) {
            return Err(ConfigurationError::DuplicateParameter(parameter.name));
        }
        if let Some(dist) = &parameter.distribution {
            dist.validate()?;
        }
        self.parameters.push(parameter);
        Ok(())
    }

    /// Chainable form of [`ParameterSet::add`].
    pub fn with(mut self, parameter: Parameter) -> Result<Self, ConfigurationError> {
        self.add(parameter)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn uncertain_names(&self) -> Vec<&str> {
        self.uncertain().map(|p| p.name.as_str()).collect()
    }

    pub fn fixed_names(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| !p.is_uncertain())
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Uncertain parameters in canonical order.
    pub fn uncertain(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.is_uncertain())
    }

    /// Distributions of the uncertain parameters in canonical order.
    pub fn distributions(&self) -> Vec<Distribution> {
        self.uncertain().filter_map(|p| p.distribution).collect()
    }

    pub fn set_distribution(
        &mut self,
        name: &str,
        distribution: Distribution,
    ) -> Result<(), ConfigurationError> {
        distribution.validate()?;
        let parameter = self
            .parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigurationError::UnknownParameter(name.to_string()))?;
        parameter.distribution = Some(distribution);
        Ok(())
    }

    /// Make `name` fixed at its nominal value.
    pub fn fix(&mut self, name: &str) -> Result<(), ConfigurationError> {
        let parameter = self
            .parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigurationError::UnknownParameter(name.to_string()))?;
        parameter.distribution = None;
        Ok(())
    }

    /// Give every parameter a distribution derived from its nominal value.
    pub fn set_all_distributions<F>(&mut self, mut factory: F) -> Result<(), ConfigurationError>
    where
        F: FnMut(f64) -> Result<Distribution, ConfigurationError>,
    {
        for parameter in &mut self.parameters {
            parameter.distribution = Some(factory(parameter.value)?);
        }
        Ok(())
    }

    /// Build a concrete sample from node coordinates of the uncertain parameters.
    pub fn realize(
        &self,
        coordinates: &[f64],
        space: CoordinateSpace,
        weight: f64,
    ) -> Result<Sample, ConfigurationError> {
        let expected = self.uncertain().count();
        if coordinates.len() != expected {
            return Err(ConfigurationError::CoordinateCount {
                expected,
                actual: coordinates.len(),
            });
        }

        let mut coords = coordinates.iter();
        let values = self
            .parameters
            .iter()
            .map(|p| {
                let value = match (&p.distribution, space) {
                    (None, _) => p.value,
                    (Some(dist), CoordinateSpace::Germ) => dist.from_germ(next(&mut coords)),
                    (Some(dist), CoordinateSpace::Probability) => {
                        dist.inverse_cdf(next(&mut coords))
                    }
                    (Some(_), CoordinateSpace::Value) => next(&mut coords),
                };
                (p.name.clone(), value)
            })
            .collect();

        Ok(Sample { values, weight })
    }

    /// Sample with every parameter at its nominal value.
    pub fn nominal(&self) -> Sample {
        Sample {
            values: self
                .parameters
                .iter()
                .map(|p| (p.name.clone(), p.value))
                .collect(),
            weight: 1.0,
        }
    }
}

fn next<'a>(coords: &mut impl Iterator<Item = &'a f64>) -> f64 {
    // Length was checked against the uncertain count before iterating.
    coords.next().copied().unwrap_or(f64::NAN)
}
