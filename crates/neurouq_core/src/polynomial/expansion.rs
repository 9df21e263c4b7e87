//! Polynomial-chaos expansion of a vector-valued response.
//!
//! Coefficients are stored per basis term, each holding one value per output
//! point, so every statistic is computed column-wise in one pass.

use nalgebra::{Cholesky, DMatrix};

use super::basis::Basis;

#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    basis: Basis,
    /// `coefficients[term][point]`
    coefficients: Vec<Vec<f64>>,
}

impl Expansion {
    /// Pseudo-spectral projection: `c_a = sum_i w_i psi_a(x_i) y_i`.
    ///
    /// Weights must sum to one and `nodes`/`values` must cover the full rule.
    pub fn project(basis: Basis, nodes: &[Vec<f64>], weights: &[f64], values: &[Vec<f64>]) -> Self {
        let points = values.first().map_or(0, Vec::len);
        let mut coefficients = vec![vec![0.0; points]; basis.len()];

        for ((node, &weight), row) in nodes.iter().zip(weights).zip(values) {
            let psi = basis.evaluate(node);
            for (coefficient, &p) in coefficients.iter_mut().zip(&psi) {
                for (c, &y) in coefficient.iter_mut().zip(row) {
                    *c += weight * p * y;
                }
            }
        }

        Self {
            basis,
            coefficients,
        }
    }

    /// Least-squares fit through the normal equations.
    ///
    /// Returns `None` when the system is rank deficient.
    pub fn regress(basis: Basis, nodes: &[Vec<f64>], values: &[Vec<f64>]) -> Option<Self> {
        let terms = basis.len();
        let points = values.first().map_or(0, Vec::len);
        let rows: Vec<Vec<f64>> = nodes.iter().map(|node| basis.evaluate(node)).collect();

        let design = DMatrix::from_fn(rows.len(), terms, |i, a| rows[i][a]);
        let observed = DMatrix::from_fn(values.len(), points, |i, p| values[i][p]);
        let gram = design.transpose() * &design;
        let rhs = design.transpose() * observed;

        let floor = gram.diagonal().amax() * 1e-12;
        let factor = Cholesky::new(gram)?;
        if factor.l_dirty().diagonal().iter().any(|&d| d * d <= floor) {
            return None;
        }
        let solution = factor.solve(&rhs);

        let coefficients = solution
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();

        Some(Self {
            basis,
            coefficients,
        })
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn coefficients(&self) -> &[Vec<f64>] {
        &self.coefficients
    }

    pub fn mean(&self) -> Vec<f64> {
        self.coefficients.first().cloned().unwrap_or_default()
    }

    pub fn variance(&self) -> Vec<f64> {
        let points = self.coefficients.first().map_or(0, Vec::len);
        let mut variance = vec![0.0; points];
        for coefficient in self.coefficients.iter().skip(1) {
            for (v, c) in variance.iter_mut().zip(coefficient) {
                *v += c * c;
            }
        }
        variance
    }

    /// First-order indices, `[parameter][point]`.
    ///
    /// Terms that depend on more than one parameter contribute to the variance
    /// but to no index, so the indices sum to at most one.
    pub fn first_order_sensitivity(&self) -> Vec<Vec<f64>> {
        let variance = self.variance();
        let mean = self.mean();
        let dimension = self.basis.dimension();
        let mut partial = vec![vec![0.0; variance.len()]; dimension];

        for (alpha, coefficient) in self.basis.indices().iter().zip(&self.coefficients) {
            let mut active = alpha.iter().enumerate().filter(|(_, d)| **d > 0);
            let (Some((parameter, _)), None) = (active.next(), active.next()) else {
                continue;
            };
            for (s, c) in partial[parameter].iter_mut().zip(coefficient) {
                *s += c * c;
            }
        }

        for row in &mut partial {
            for ((s, &v), &m) in row.iter_mut().zip(&variance).zip(&mean) {
                *s = if vanishing(v, m) { 0.0 } else { *s / v };
            }
        }
        partial
    }

    /// Surrogate value at a germ point.
    pub fn evaluate(&self, point: &[f64]) -> Vec<f64> {
        let psi = self.basis.evaluate(point);
        let points = self.coefficients.first().map_or(0, Vec::len);
        let mut out = vec![0.0; points];
        for (coefficient, p) in self.coefficients.iter().zip(psi) {
            for (o, c) in out.iter_mut().zip(coefficient) {
                *o += c * p;
            }
        }
        out
    }
}

/// Variance at round-off level relative to the mean.
pub(crate) fn vanishing(variance: f64, mean: f64) -> bool {
    variance <= 1e-24 * (1.0 + mean * mean)
}
