//! Sampling schemes and sample generation.
//!
//! Polynomial chaos uses a tensor-product Gauss rule in germ space; Monte
//! Carlo draws independently in value space, optionally in the Saltelli
//! block layout needed for first-order Sobol indices.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::ConfigurationError;
use crate::parameters::{CoordinateSpace, ParameterSet, Sample};
use crate::polynomial::{QuadratureRule, TensorGrid};

pub const DEFAULT_PERCENTILE_SAMPLES: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    /// Weighted projection onto the basis, least squares if any node is excluded.
    #[default]
    Spectral,
    /// Always least squares.
    Regression,
}

fn default_percentile_samples() -> usize {
    DEFAULT_PERCENTILE_SAMPLES
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scheme {
    PolynomialChaos {
        order: usize,
        #[serde(default = "default_percentile_samples")]
        percentile_samples: usize,
        #[serde(default)]
        method: FitMethod,
    },
    MonteCarlo {
        samples: usize,
        #[serde(default)]
        sobol: bool,
    },
}

impl Scheme {
    pub fn polynomial_chaos(order: usize) -> Self {
        Scheme::PolynomialChaos {
            order,
            percentile_samples: DEFAULT_PERCENTILE_SAMPLES,
            method: FitMethod::Spectral,
        }
    }

    pub fn monte_carlo(samples: usize) -> Self {
        Scheme::MonteCarlo {
            samples,
            sobol: false,
        }
    }

    pub fn monte_carlo_sobol(samples: usize) -> Self {
        Scheme::MonteCarlo {
            samples,
            sobol: true,
        }
    }

    /// Short label used in logs and file names.
    pub fn label(&self) -> &'static str {
        match self {
            Scheme::PolynomialChaos { .. } => "pc",
            Scheme::MonteCarlo { .. } => "mc",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Scheme::PolynomialChaos {
                order,
                percentile_samples,
                ..
            } => {
                if order == 0 {
                    return Err(ConfigurationError::InvalidScheme(
                        "polynomial order must be at least 1".into(),
                    ));
                }
                if percentile_samples == 0 {
                    return Err(ConfigurationError::InvalidScheme(
                        "percentile_samples must be positive".into(),
                    ));
                }
            }
            Scheme::MonteCarlo { samples, sobol } => {
                if samples == 0 {
                    return Err(ConfigurationError::InvalidScheme(
                        "Monte Carlo sample count must be positive".into(),
                    ));
                }
                if sobol && samples < 2 {
                    return Err(ConfigurationError::InvalidScheme(
                        "Sobol estimation needs at least 2 base samples".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// How the rows of a [`SampleSet`] relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleLayout {
    /// Tensor quadrature nodes in germ space.
    Quadrature,
    /// Independent Monte Carlo draws.
    Independent,
    /// Blocks `A`, `B`, `AB_1 .. AB_k`, each `base` rows long.
    Saltelli { base: usize, dimension: usize },
}

impl SampleLayout {
    /// Row range of block `A`, `B` or `AB_i` for a Saltelli layout.
    pub fn block(&self, block: SaltelliBlock) -> Option<std::ops::Range<usize>> {
        let SampleLayout::Saltelli { base, dimension } = *self else {
            return None;
        };
        let index = match block {
            SaltelliBlock::A => 0,
            SaltelliBlock::B => 1,
            SaltelliBlock::Mixed(i) if i < dimension => 2 + i,
            SaltelliBlock::Mixed(_) => return None,
        };
        Some(index * base..(index + 1) * base)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltelliBlock {
    A,
    B,
    /// `A` with column `i` taken from `B`.
    Mixed(usize),
}

/// Ordered samples plus the coordinates and weights that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    pub samples: Vec<Sample>,
    /// Germ coordinates for quadrature, value-space draws for Monte Carlo.
    pub nodes: Vec<Vec<f64>>,
    pub weights: Vec<f64>,
    pub layout: SampleLayout,
    pub uncertain_names: Vec<String>,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Generate every sample a scheme needs, in evaluation order.
pub fn generate_samples(
    parameters: &ParameterSet,
    scheme: &Scheme,
    seed: u64,
) -> Result<SampleSet, ConfigurationError> {
    scheme.validate()?;
    let distributions = parameters.distributions();
    if distributions.is_empty() {
        return Err(ConfigurationError::NoUncertainParameters);
    }
    let uncertain_names = parameters
        .uncertain_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let (nodes, weights, layout, space) = match *scheme {
        Scheme::PolynomialChaos { order, .. } => {
            let rules: Vec<QuadratureRule> = distributions
                .iter()
                .map(|d| QuadratureRule::for_germ(d.germ(), order + 1))
                .collect();
            let grid = TensorGrid::new(&rules);
            let total: f64 = grid.weights.iter().sum();
            let weights = grid.weights.iter().map(|w| w / total).collect();
            (grid.nodes, weights, SampleLayout::Quadrature, CoordinateSpace::Germ)
        }
        Scheme::MonteCarlo { samples, sobol } => {
            let mut rng = SmallRng::seed_from_u64(seed);
            let nodes = if sobol {
                saltelli(&distributions, samples, &mut rng)
            } else {
                draw_matrix(&distributions, samples, &mut rng)
            };
            let layout = if sobol {
                SampleLayout::Saltelli {
                    base: samples,
                    dimension: distributions.len(),
                }
            } else {
                SampleLayout::Independent
            };
            let weight = 1.0 / nodes.len() as f64;
            let weights = vec![weight; nodes.len()];
            (nodes, weights, layout, CoordinateSpace::Value)
        }
    };

    let samples = nodes
        .iter()
        .zip(&weights)
        .map(|(node, &w)| parameters.realize(node, space, w))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SampleSet {
        samples,
        nodes,
        weights,
        layout,
        uncertain_names,
    })
}

fn draw_matrix(distributions: &[Distribution], rows: usize, rng: &mut SmallRng) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|_| distributions.iter().map(|d| d.draw(rng)).collect())
        .collect()
}

fn saltelli(distributions: &[Distribution], base: usize, rng: &mut SmallRng) -> Vec<Vec<f64>> {
    let a = draw_matrix(distributions, base, rng);
    let b = draw_matrix(distributions, base, rng);

    let mut nodes = Vec::with_capacity(base * (distributions.len() + 2));
    nodes.extend(a.iter().cloned());
    nodes.extend(b.iter().cloned());
    for column in 0..distributions.len() {
        nodes.extend(a.iter().zip(&b).map(|(row_a, row_b)| {
            let mut row = row_a.clone();
            row[column] = row_b[column];
            row
        }));
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Parameter;

    fn params() -> ParameterSet {
        ParameterSet::new()
            .with(Parameter::uncertain("a", 1.0, Distribution::uniform(0.5, 1.5).unwrap()))
            .unwrap()
            .with(Parameter::fixed("c", 7.0))
            .unwrap()
            .with(Parameter::uncertain("b", 2.0, Distribution::normal(2.0, 0.1).unwrap()))
            .unwrap()
    }

    #[test]
    fn test_quadrature_samples() {
        let set = generate_samples(&params(), &Scheme::polynomial_chaos(2), 0).unwrap();
        assert_eq!(set.len(), 9);
        assert_eq!(set.layout, SampleLayout::Quadrature);
        assert_eq!(set.uncertain_names, vec!["a", "b"]);
        assert!((set.weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        for sample in &set.samples {
            assert_eq!(sample.get("c"), Some(7.0));
            let a = sample.get("a").unwrap();
            assert!((0.5..=1.5).contains(&a));
        }
        // Middle Legendre node maps to the centre of the interval.
        assert!((set.samples[4].get("a").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_monte_carlo_is_seeded() {
        let scheme = Scheme::monte_carlo(50);
        let first = generate_samples(&params(), &scheme, 42).unwrap();
        let second = generate_samples(&params(), &scheme, 42).unwrap();
        let other = generate_samples(&params(), &scheme, 43).unwrap();

        assert_eq!(first.samples, second.samples);
        assert_ne!(first.samples, other.samples);
        assert_eq!(first.layout, SampleLayout::Independent);
        assert!((first.weights[0] - 0.02).abs() < 1e-15);
    }

    #[test]
    fn test_saltelli_layout() {
        let set = generate_samples(&params(), &Scheme::monte_carlo_sobol(8), 1).unwrap();
        assert_eq!(set.len(), 8 * 4);

        let a = set.layout.block(SaltelliBlock::A).unwrap();
        let b = set.layout.block(SaltelliBlock::B).unwrap();
        let ab1 = set.layout.block(SaltelliBlock::Mixed(1)).unwrap();
        assert_eq!(ab1, 24..32);
        assert!(set.layout.block(SaltelliBlock::Mixed(2)).is_none());

        for row in 0..8 {
            let mixed = &set.nodes[ab1.start + row];
            assert_eq!(mixed[0], set.nodes[a.start + row][0]);
            assert_eq!(mixed[1], set.nodes[b.start + row][1]);
        }
    }

    #[test]
    fn test_invalid_requests() {
        assert_eq!(
            generate_samples(&ParameterSet::new(), &Scheme::monte_carlo(3), 0),
            Err(ConfigurationError::NoUncertainParameters)
        );
        assert!(matches!(
            generate_samples(&params(), &Scheme::monte_carlo(0), 0),
            Err(ConfigurationError::InvalidScheme(_))
        ));
        assert!(Scheme::polynomial_chaos(0).validate().is_err());
    }

    #[test]
    fn test_scheme_serde_tagging() {
        let scheme: Scheme = serde_json::from_str(r#"{"type":"polynomial_chaos","order":3}"#).unwrap();
        assert_eq!(scheme, Scheme::polynomial_chaos(3));
        let scheme: Scheme = serde_json::from_str(r#"{"type":"monte_carlo","samples":10}"#).unwrap();
        assert_eq!(scheme.label(), "mc");
    }
}
