//! Probability laws for uncertain parameters.
//!
//! A [`Distribution`] is sampled in value space for Monte Carlo runs and mapped
//! from a standard polynomial-chaos germ for quadrature runs. Uniform laws use
//! the Legendre germ on `[-1, 1]`; normal and log-normal laws use the standard
//! normal (Hermite) germ.

use rand::distr::Uniform;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution as _, LogNormal, Normal, StandardNormal};
use serde::{Deserialize, Serialize};
use statrs::distribution::{self as law, ContinuousCDF};

use crate::error::ConfigurationError;

/// Standard random variable underlying a distribution in the polynomial expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Germ {
    /// Uniform on `[-1, 1]`, orthogonal family: Legendre.
    Legendre,
    /// Standard normal, orthogonal family: probabilists' Hermite.
    Hermite,
}

impl Germ {
    /// Draw one germ value.
    pub fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            Germ::Legendre => rng.random_range(-1.0..=1.0),
            Germ::Hermite => StandardNormal.sample(rng),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distribution {
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std_dev: f64 },
    /// `exp(N(mu, sigma))`
    LogNormal { mu: f64, sigma: f64 },
}

impl Distribution {
    pub fn uniform(low: f64, high: f64) -> Result<Self, ConfigurationError> {
        let dist = Distribution::Uniform { low, high };
        dist.validate()?;
        Ok(dist)
    }

    pub fn normal(mean: f64, std_dev: f64) -> Result<Self, ConfigurationError> {
        let dist = Distribution::Normal { mean, std_dev };
        dist.validate()?;
        Ok(dist)
    }

    pub fn log_normal(mu: f64, sigma: f64) -> Result<Self, ConfigurationError> {
        let dist = Distribution::LogNormal { mu, sigma };
        dist.validate()?;
        Ok(dist)
    }

    /// Uniform law of total width `interval` centred on `value`.
    pub fn uniform_around(value: f64, interval: f64) -> Result<Self, ConfigurationError> {
        Self::uniform(value - interval / 2.0, value + interval / 2.0)
    }

    /// Normal law centred on `value` with standard deviation `interval * value`.
    pub fn normal_around(value: f64, interval: f64) -> Result<Self, ConfigurationError> {
        Self::normal(value, (interval * value).abs())
    }

    /// Check the shape parameters. Deserialized values must pass through here.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Distribution::Uniform { low, high } => {
                if !low.is_finite() || !high.is_finite() || high <= low {
                    return Err(ConfigurationError::InvalidDistribution {
                        kind: "uniform",
                        detail: format!("low={low}, high={high}"),
                        reason: "bounds must be finite with high > low",
                    });
                }
            }
            Distribution::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
                    return Err(ConfigurationError::InvalidDistribution {
                        kind: "normal",
                        detail: format!("mean={mean}, std_dev={std_dev}"),
                        reason: "std_dev must be positive and finite",
                    });
                }
            }
            Distribution::LogNormal { mu, sigma } => {
                if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
                    return Err(ConfigurationError::InvalidDistribution {
                        kind: "log-normal",
                        detail: format!("mu={mu}, sigma={sigma}"),
                        reason: "sigma must be positive and finite",
                    });
                }
            }
        }
        Ok(())
    }

    pub fn germ(&self) -> Germ {
        match self {
            Distribution::Uniform { .. } => Germ::Legendre,
            Distribution::Normal { .. } | Distribution::LogNormal { .. } => Germ::Hermite,
        }
    }

    /// Support bounds, `None` when the support is unbounded.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match *self {
            Distribution::Uniform { low, high } => Some((low, high)),
            Distribution::Normal { .. } | Distribution::LogNormal { .. } => None,
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Distribution::Uniform { low, high } => 0.5 * (low + high),
            Distribution::Normal { mean, .. } => mean,
            Distribution::LogNormal { mu, sigma } => (mu + 0.5 * sigma * sigma).exp(),
        }
    }

    /// Draw one value.
    ///
    /// Shape parameters are assumed valid; an invalid law yields NaN.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Distribution::Uniform { low, high } => Uniform::new_inclusive(low, high)
                .map(|d| d.sample(rng))
                .unwrap_or(f64::NAN),
            Distribution::Normal { mean, std_dev } => Normal::new(mean, std_dev)
                .map(|d| d.sample(rng))
                .unwrap_or(f64::NAN),
            Distribution::LogNormal { mu, sigma } => LogNormal::new(mu, sigma)
                .map(|d| d.sample(rng))
                .unwrap_or(f64::NAN),
        }
    }

    /// Draw `count` values, deterministic for a given seed.
    pub fn sample(&self, count: usize, seed: u64) -> Vec<f64> {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
        (0..count).map(|_| self.draw(&mut rng)).collect()
    }

    /// Map a germ coordinate into value space.
    pub fn from_germ(&self, x: f64) -> f64 {
        match *self {
            Distribution::Uniform { low, high } => low + 0.5 * (x + 1.0) * (high - low),
            Distribution::Normal { mean, std_dev } => mean + std_dev * x,
            Distribution::LogNormal { mu, sigma } => (mu + sigma * x).exp(),
        }
    }

    /// Quantile function for `p` in `(0, 1)`. Values outside are clamped to the support.
    ///
    /// Shape parameters are assumed valid; an invalid law yields NaN.
    pub fn inverse_cdf(&self, p: f64) -> f64 {
        if p.is_nan() {
            return f64::NAN;
        }
        let p = p.clamp(0.0, 1.0);
        match *self {
            Distribution::Uniform { low, high } => law::Uniform::new(low, high)
                .map(|d| d.inverse_cdf(p))
                .unwrap_or(f64::NAN),
            Distribution::Normal { mean, std_dev } => law::Normal::new(mean, std_dev)
                .map(|d| d.inverse_cdf(p))
                .unwrap_or(f64::NAN),
            Distribution::LogNormal { mu, sigma } => law::LogNormal::new(mu, sigma)
                .map(|d| d.inverse_cdf(p))
                .unwrap_or(f64::NAN),
        }
    }
}
