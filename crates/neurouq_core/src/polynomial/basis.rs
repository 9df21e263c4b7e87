//! Orthonormal polynomial basis over independent germs.

use crate::distribution::Germ;

/// `psi_0(x) ..= psi_degree(x)`, orthonormal under the germ's density.
///
/// Legendre terms are `sqrt(2n + 1) P_n`; Hermite terms are `He_n / sqrt(n!)`.
pub fn orthonormal_values(germ: Germ, degree: usize, x: f64) -> Vec<f64> {
    let mut values = Vec::with_capacity(degree + 1);
    values.push(1.0);
    if degree == 0 {
        return values;
    }
    values.push(x);

    for n in 1..degree {
        let nf = n as f64;
        let next = match germ {
            Germ::Legendre => ((2.0 * nf + 1.0) * x * values[n] - nf * values[n - 1]) / (nf + 1.0),
            Germ::Hermite => x * values[n] - nf * values[n - 1],
        };
        values.push(next);
    }

    let mut factorial = 1.0;
    for (n, value) in values.iter_mut().enumerate() {
        match germ {
            Germ::Legendre => *value *= (2.0 * n as f64 + 1.0).sqrt(),
            Germ::Hermite => {
                if n > 0 {
                    factorial *= n as f64;
                }
                *value /= factorial.sqrt();
            }
        }
    }
    values
}

/// All multi-indices of length `dimension` with total degree at most `order`.
///
/// Graded by total degree, lexicographically descending within a degree, so the
/// constant term comes first and `e_0, e_1, ...` follow it.
pub fn total_degree_indices(dimension: usize, order: usize) -> Vec<Vec<usize>> {
    let mut indices = Vec::new();
    for degree in 0..=order {
        let mut current = vec![0; dimension];
        compositions(dimension, degree, 0, &mut current, &mut indices);
    }
    indices
}

fn compositions(
    dimension: usize,
    remaining: usize,
    position: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if dimension == 0 {
        if remaining == 0 {
            out.push(Vec::new());
        }
        return;
    }
    if position == dimension - 1 {
        current[position] = remaining;
        out.push(current.clone());
        return;
    }
    for k in (0..=remaining).rev() {
        current[position] = k;
        compositions(dimension, remaining - k, position + 1, current, out);
    }
    current[position] = 0;
}

/// Truncated product basis of total degree at most `order`.
#[derive(Debug, Clone, PartialEq)]
pub struct Basis {
    germs: Vec<Germ>,
    order: usize,
    indices: Vec<Vec<usize>>,
}

impl Basis {
    pub fn new(germs: Vec<Germ>, order: usize) -> Self {
        let indices = total_degree_indices(germs.len(), order);
        Self {
            germs,
            order,
            indices,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.germs.len()
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn indices(&self) -> &[Vec<usize>] {
        &self.indices
    }

    /// Every basis term at a germ point.
    pub fn evaluate(&self, point: &[f64]) -> Vec<f64> {
        let univariate: Vec<Vec<f64>> = self
            .germs
            .iter()
            .zip(point)
            .map(|(&germ, &x)| orthonormal_values(germ, self.order, x))
            .collect();

        self.indices
            .iter()
            .map(|alpha| {
                alpha
                    .iter()
                    .enumerate()
                    .map(|(dim, &degree)| univariate[dim][degree])
                    .product()
            })
            .collect()
    }
}
