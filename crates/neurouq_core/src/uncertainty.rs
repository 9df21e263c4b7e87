//! Turns an ensemble into per-quantity statistics.
//!
//! Polynomial chaos fits an expansion per quantity and reads moments and
//! first-order indices off its coefficients. Monte Carlo uses sample moments,
//! plus a Saltelli estimator when the samples were drawn in that layout.

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::RunContext;
use crate::data::{QuantityFailure, QuantityStatistics, UncertaintyData};
use crate::distribution::Germ;
use crate::ensemble::{Ensemble, QuantityEnsemble};
use crate::error::{ConfigurationError, ConsistencyError, Result};
use crate::features::FeatureSet;
use crate::model::Model;
use crate::parameters::ParameterSet;
use crate::polynomial::{Basis, Expansion, vanishing};
use crate::sampling::{FitMethod, SaltelliBlock, SampleLayout, SampleSet, Scheme, generate_samples};
use crate::simulation;
use crate::statistics::{column_mean, column_quantiles, column_variance, percentile};

/// Generate samples, evaluate them and compute statistics in one call.
pub fn propagate<M: Model + ?Sized>(
    model: &M,
    features: &FeatureSet,
    parameters: &ParameterSet,
    scheme: &Scheme,
    ctx: &RunContext,
) -> Result<UncertaintyData> {
    let samples = generate_samples(parameters, scheme, ctx.config.seed)?;
    let ensemble = simulation::run(model, features, &samples.samples, ctx)?;
    compute(&ensemble, parameters, &samples, scheme, ctx)
}

/// Statistics for every quantity of `ensemble`.
///
/// `samples` must be the set the ensemble was evaluated from. A quantity that
/// cannot be fitted is recorded in `failures` alongside those the ensemble
/// already dropped.
pub fn compute(
    ensemble: &Ensemble,
    parameters: &ParameterSet,
    samples: &SampleSet,
    scheme: &Scheme,
    ctx: &RunContext,
) -> Result<UncertaintyData> {
    scheme.validate()?;
    let span = ctx.span();
    let _guard = span.enter();

    let germs: Vec<Germ> = parameters.distributions().iter().map(|d| d.germ()).collect();
    check_samples(ensemble, samples, scheme, germs.len())?;
    let mut data = UncertaintyData::new(
        ctx.name.clone(),
        scheme.clone(),
        samples.uncertain_names.clone(),
        ensemble.sample_count,
    );
    data.failed_samples = ensemble.failed_samples.len();
    data.failures = ensemble
        .failures
        .iter()
        .map(|error| QuantityFailure {
            quantity: error.quantity().to_string(),
            reason: error.to_string(),
        })
        .collect();

    for quantity in &ensemble.quantities {
        let result = match *scheme {
            Scheme::PolynomialChaos {
                order,
                percentile_samples,
                method,
            } => polynomial_chaos(
                quantity,
                samples,
                PcSettings {
                    germs: &germs,
                    order,
                    percentile_samples,
                    method,
                    seed: ctx.config.seed,
                },
            ),
            Scheme::MonteCarlo { .. } => Ok(monte_carlo(quantity, samples)),
        };

        match result {
            Ok(stats) => {
                data.quantities.insert(quantity.name.clone(), stats);
            }
            Err(error) => {
                tracing::warn!(%error, "skipping quantity");
                data.failures.push(QuantityFailure {
                    quantity: quantity.name.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    data.reclassify();
    tracing::info!(
        scheme = scheme.label(),
        quantities = data.quantities.len(),
        failures = data.failures.len(),
        "uncertainty computed"
    );
    Ok(data)
}

/// The sample set must be the one `ensemble` was evaluated from, laid out for `scheme`.
fn check_samples(
    ensemble: &Ensemble,
    samples: &SampleSet,
    scheme: &Scheme,
    dimension: usize,
) -> std::result::Result<(), ConfigurationError> {
    let mismatch = |reason: String| Err(ConfigurationError::InvalidScheme(reason));

    if ensemble.sample_count != samples.len() {
        return mismatch(format!(
            "ensemble holds {} samples but the sample set has {}",
            ensemble.sample_count,
            samples.len()
        ));
    }
    if samples.nodes.len() != samples.len() || samples.weights.len() != samples.len() {
        return mismatch(format!(
            "sample set has {} samples, {} nodes and {} weights",
            samples.len(),
            samples.nodes.len(),
            samples.weights.len()
        ));
    }
    if samples.uncertain_names.len() != dimension {
        return mismatch(format!(
            "sample set covers {} uncertain parameters, expected {dimension}",
            samples.uncertain_names.len()
        ));
    }

    match (scheme, samples.layout) {
        (Scheme::PolynomialChaos { .. }, SampleLayout::Quadrature) => {
            if let Some(node) = samples.nodes.iter().find(|n| n.len() != dimension) {
                return mismatch(format!(
                    "quadrature node has {} coordinates, expected {dimension}",
                    node.len()
                ));
            }
        }
        (Scheme::MonteCarlo { sobol: false, .. }, SampleLayout::Independent) => {}
        (Scheme::MonteCarlo { sobol: true, .. }, SampleLayout::Saltelli { base, dimension: k }) => {
            if k != dimension || base * (k + 2) != samples.len() {
                return mismatch(format!(
                    "Saltelli layout of {base} x ({k} + 2) rows does not fit {} samples over {dimension} parameters",
                    samples.len()
                ));
            }
        }
        (scheme, layout) => {
            return mismatch(format!(
                "{} scheme cannot use a {layout:?} sample layout",
                scheme.label()
            ));
        }
    }
    Ok(())
}

struct PcSettings<'a> {
    germs: &'a [Germ],
    order: usize,
    percentile_samples: usize,
    method: FitMethod,
    seed: u64,
}

fn polynomial_chaos(
    quantity: &QuantityEnsemble,
    samples: &SampleSet,
    settings: PcSettings<'_>,
) -> std::result::Result<QuantityStatistics, ConsistencyError> {
    let basis = Basis::new(settings.germs.to_vec(), settings.order);
    let nodes: Vec<Vec<f64>> = quantity
        .sample_indices
        .iter()
        .map(|&i| samples.nodes[i].clone())
        .collect();

    let expansion = if settings.method == FitMethod::Spectral && quantity.excluded.is_empty() {
        Expansion::project(basis, &nodes, &samples.weights, &quantity.rows)
    } else {
        if nodes.len() < basis.len() {
            return Err(ConsistencyError::InsufficientSamples {
                quantity: quantity.name.clone(),
                valid: nodes.len(),
                required: basis.len(),
            });
        }
        tracing::debug!(
            quantity = %quantity.name,
            excluded = quantity.excluded_count(),
            "fitting by least squares"
        );
        Expansion::regress(basis, &nodes, &quantity.rows).ok_or_else(|| {
            ConsistencyError::SingularFit {
                quantity: quantity.name.clone(),
            }
        })?
    };

    let mut rng = SmallRng::seed_from_u64(settings.seed);
    let surrogate: Vec<Vec<f64>> = (0..settings.percentile_samples)
        .map(|_| {
            let point: Vec<f64> = settings.germs.iter().map(|g| g.draw(&mut rng)).collect();
            expansion.evaluate(&point)
        })
        .collect();
    let mut bands = column_quantiles(&surrogate, &[percentile::P5, percentile::P95]).into_iter();

    let sensitivity = (settings.germs.len() >= 2).then(|| expansion.first_order_sensitivity());

    Ok(QuantityStatistics {
        time: quantity.time.clone(),
        shape: quantity.shape.clone(),
        mean: expansion.mean(),
        variance: expansion.variance(),
        percentile_5: bands.next().unwrap_or_default(),
        percentile_95: bands.next().unwrap_or_default(),
        sensitivity,
        evaluated: quantity.len(),
        excluded: quantity.excluded_count(),
    })
}

fn monte_carlo(quantity: &QuantityEnsemble, samples: &SampleSet) -> QuantityStatistics {
    let mean = column_mean(&quantity.rows);
    let variance = column_variance(&quantity.rows, &mean);
    let mut bands = column_quantiles(&quantity.rows, &[percentile::P5, percentile::P95]).into_iter();

    let sensitivity = match samples.layout {
        SampleLayout::Saltelli { dimension, .. } if dimension >= 2 => {
            saltelli_first_order(quantity, samples, &mean, &variance)
        }
        _ => None,
    };

    QuantityStatistics {
        time: quantity.time.clone(),
        shape: quantity.shape.clone(),
        percentile_5: bands.next().unwrap_or_default(),
        percentile_95: bands.next().unwrap_or_default(),
        mean,
        variance,
        sensitivity,
        evaluated: quantity.len(),
        excluded: quantity.excluded_count(),
    }
}

/// `S_i = mean(f_B (f_ABi - f_A)) / Var`, over base rows where all three are valid.
///
/// `None` if any parameter is left with fewer than two usable rows.
fn saltelli_first_order(
    quantity: &QuantityEnsemble,
    samples: &SampleSet,
    mean: &[f64],
    variance: &[f64],
) -> Option<Vec<Vec<f64>>> {
    let SampleLayout::Saltelli { base, dimension } = samples.layout else {
        return None;
    };

    let mut row_of = vec![None; samples.len()];
    for (row, &index) in quantity.sample_indices.iter().enumerate() {
        row_of[index] = Some(row);
    }

    let a = samples.layout.block(SaltelliBlock::A)?;
    let b = samples.layout.block(SaltelliBlock::B)?;
    let mut indices = Vec::with_capacity(dimension);

    for parameter in 0..dimension {
        let ab = samples.layout.block(SaltelliBlock::Mixed(parameter))?;
        let mut sum = vec![0.0; mean.len()];
        let mut used = 0usize;

        for j in 0..base {
            let (Some(ra), Some(rb), Some(rab)) =
                (row_of[a.start + j], row_of[b.start + j], row_of[ab.start + j])
            else {
                continue;
            };
            let (fa, fb, fab) = (&quantity.rows[ra], &quantity.rows[rb], &quantity.rows[rab]);
            for (k, s) in sum.iter_mut().enumerate() {
                *s += fb[k] * (fab[k] - fa[k]);
            }
            used += 1;
        }

        if used < 2 {
            tracing::debug!(quantity = %quantity.name, parameter, used, "too few rows for Sobol estimate");
            return None;
        }
        indices.push(
            sum.iter()
                .zip(variance)
                .zip(mean)
                .map(|((s, &v), &m)| if vanishing(v, m) { 0.0 } else { s / used as f64 / v })
                .collect(),
        );
    }
    Some(indices)
}
