//! Uncertainty quantification for neuron models
//!
//! This crate propagates parameter uncertainty through simulation models and
//! reports moments, percentile bands and first-order sensitivity indices for
//! the model output and every derived feature. It supports:
//! - Uniform, normal and log-normal parameter distributions
//! - Polynomial chaos (tensor Gauss quadrature, spectral or least-squares fit)
//! - Monte Carlo, optionally with Saltelli sampling for Sobol indices
//! - Parallel, index-ordered sample evaluation with per-sample failure isolation
//! - Resampling of irregular time axes onto a shared grid
//! - Built-in spike features for voltage traces
//! - JSON persistence and multi-scenario exploration
//!
//! # Example
//!
//! ```ignore
//! use neurouq_core::{propagate, Distribution, FeatureSet, Parameter, ParameterSet, RunConfig, RunContext, Scheme};
//!
//! let parameters = ParameterSet::new()
//!     .with(Parameter::uncertain("kappa", -0.05, Distribution::uniform(-0.075, -0.025)?))?
//!     .with(Parameter::uncertain("u_env", 20.0, Distribution::uniform(15.0, 25.0)?))?;
//! let ctx = RunContext::new("coffee_cup", RunConfig::default());
//! let data = propagate(&model, &FeatureSet::new(), &parameters, &Scheme::polynomial_chaos(4), &ctx)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod ensemble;
pub mod error;
pub mod evaluate;
pub mod exploration;
pub mod polynomial;
pub mod sampling;
pub mod simulation;
pub mod statistics;
pub mod storage;
pub mod uncertainty;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod data;
pub mod distribution;
pub mod features;
pub mod model;
pub mod parameters;

// ============================================================================
// Testing collaborators
// ============================================================================

pub mod testing;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{RunConfig, RunContext, RunControl, TimeGrid};
pub use data::{DataOrigin, QuantityStatistics, Statistic, UncertaintyData};
pub use distribution::Distribution;
pub use ensemble::{Ensemble, QuantityEnsemble};
pub use error::{
    ConfigurationError, ConsistencyError, SimulationError, StorageError,
    UnsupportedDimensionalityError, UqError,
};
pub use evaluate::DIRECT_COMPARISON;
pub use exploration::{Exploration, IntervalKind, Scenario, ScenarioOutcome};
pub use features::{FeatureOutput, FeatureSet, SpikeConfig};
pub use model::{FnModel, Model, RawResult, Response};
pub use parameters::{Parameter, ParameterSet, Sample};
pub use sampling::{FitMethod, Scheme, generate_samples};
pub use uncertainty::{compute, propagate};
