//! Evaluation of a single sample: model call, features, resampling.
//!
//! Everything here is a pure function of its inputs so the orchestrator can
//! evaluate samples on any thread in any order.

use rustc_hash::FxHashMap;

use crate::error::SimulationError;
use crate::features::{FeatureOutput, FeatureSet};
use crate::model::{Model, RawResult, Response};
use crate::parameters::Sample;

/// Name under which the model's raw output enters the statistics.
pub const DIRECT_COMPARISON: &str = "direct_comparison";

/// Canonical time axis per quantity name.
pub type GridMap = FxHashMap<String, Vec<f64>>;

/// Outputs of every quantity for one sample, direct comparison first.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub quantities: Vec<(String, FeatureOutput)>,
    /// Set when the model call failed; every quantity is then `Invalid`.
    pub failure: Option<SimulationError>,
}

impl NodeRecord {
    pub fn failed(names: &[String], error: SimulationError) -> Self {
        Self {
            quantities: names
                .iter()
                .map(|name| (name.clone(), FeatureOutput::Invalid))
                .collect(),
            failure: Some(error),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureOutput> {
        self.quantities
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, output)| output)
    }

    /// Resample every 1-D quantity that has a grid in `grids`.
    pub fn resample(&mut self, grids: &GridMap) {
        for (name, output) in &mut self.quantities {
            if let Some(grid) = grids.get(name.as_str()) {
                let current = std::mem::replace(output, FeatureOutput::Invalid);
                *output = resample(current, grid);
            }
        }
    }
}

/// Runs one sample through a model and its features.
pub struct NodeEvaluator<'a, M: ?Sized> {
    model: &'a M,
    features: &'a FeatureSet,
    fixed_grid: Option<&'a [f64]>,
}

impl<'a, M: Model + ?Sized> NodeEvaluator<'a, M> {
    pub fn new(model: &'a M, features: &'a FeatureSet) -> Self {
        Self {
            model,
            features,
            fixed_grid: None,
        }
    }

    /// Resample onto `grid` during evaluation instead of afterwards.
    pub fn with_fixed_grid(mut self, grid: &'a [f64]) -> Self {
        self.fixed_grid = Some(grid);
        self
    }

    /// Quantity names in record order.
    pub fn quantity_names(&self) -> Vec<String> {
        std::iter::once(DIRECT_COMPARISON.to_string())
            .chain(self.features.names().into_iter().map(str::to_string))
            .collect()
    }

    pub fn evaluate(&self, sample: &Sample) -> NodeRecord {
        let raw = match self.model.run(sample).and_then(|raw| {
            raw.validate()?;
            Ok(raw)
        }) {
            Ok(raw) => raw,
            Err(error) => return NodeRecord::failed(&self.quantity_names(), error),
        };

        let mut quantities = Vec::with_capacity(self.features.len() + 1);
        for (name, output) in self.features.evaluate_all(&raw) {
            quantities.push((name, checked(output)));
        }
        let direct = FeatureOutput::Valid {
            time: raw.time,
            response: raw.response,
        };
        quantities.insert(0, (DIRECT_COMPARISON.to_string(), direct));

        if let Some(grid) = self.fixed_grid {
            for (_, output) in &mut quantities {
                let current = std::mem::replace(output, FeatureOutput::Invalid);
                *output = resample(current, grid);
            }
        }

        NodeRecord {
            quantities,
            failure: None,
        }
    }
}

/// A feature output whose time axis contradicts its response counts as invalid.
fn checked(output: FeatureOutput) -> FeatureOutput {
    match output {
        FeatureOutput::Valid { time, response } => {
            let raw = RawResult { time, response };
            match raw.validate() {
                Ok(()) => FeatureOutput::Valid {
                    time: raw.time,
                    response: raw.response,
                },
                Err(error) => {
                    tracing::debug!(%error, "discarding malformed feature output");
                    FeatureOutput::Invalid
                }
            }
        }
        FeatureOutput::Invalid => FeatureOutput::Invalid,
    }
}

/// Resample a 1-D output with a time axis onto `grid`.
///
/// 0-D outputs, outputs without a time axis and outputs of two or more
/// dimensions pass through untouched, as does a series already on `grid`.
pub fn resample(output: FeatureOutput, grid: &[f64]) -> FeatureOutput {
    match output {
        FeatureOutput::Valid {
            time: Some(time),
            response: Response::Series(values),
        } => {
            if time.as_slice() == grid {
                return FeatureOutput::Valid {
                    time: Some(time),
                    response: Response::Series(values),
                };
            }
            if time.is_empty() {
                return FeatureOutput::Invalid;
            }
            FeatureOutput::Valid {
                time: Some(grid.to_vec()),
                response: Response::Series(interpolate(grid, &time, &values)),
            }
        }
        other => other,
    }
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`, clamped to the end values.
///
/// `xp` must be increasing. NaN query points, or an empty `xp`, give NaN.
pub fn interpolate(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    let Some(last) = xp.len().min(fp.len()).checked_sub(1) else {
        return vec![f64::NAN; x.len()];
    };
    x.iter()
        .map(|&xi| {
            if xi.is_nan() {
                return f64::NAN;
            }
            if xi <= xp[0] {
                return fp[0];
            }
            if xi >= xp[last] {
                return fp[last];
            }
            let hi = xp[..=last].partition_point(|&t| t <= xi).clamp(1, last);
            let lo = hi - 1;
            let span = xp[hi] - xp[lo];
            if span == 0.0 {
                return fp[lo];
            }
            fp[lo] + (xi - xp[lo]) / span * (fp[hi] - fp[lo])
        })
        .collect()
}
