//! Gauss quadrature rules for the polynomial-chaos germs.
//!
//! Nodes are found by Newton iteration on the three-term recurrences. Weights
//! are probability weights: they sum to one under the germ's density.

use std::f64::consts::PI;

use crate::distribution::Germ;

const TOLERANCE: f64 = 1e-14;
const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    pub nodes: Vec<f64>,
    pub weights: Vec<f64>,
}

impl QuadratureRule {
    pub fn for_germ(germ: Germ, points: usize) -> Self {
        match germ {
            Germ::Legendre => gauss_legendre(points),
            Germ::Hermite => gauss_hermite(points),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// `n`-point Gauss–Legendre rule for the uniform density on `[-1, 1]`, nodes ascending.
pub fn gauss_legendre(n: usize) -> QuadratureRule {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let nf = n as f64;

    for i in 0..n.div_ceil(2) {
        let mut z = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
        let mut derivative = 1.0;

        for _ in 0..MAX_ITERATIONS {
            let (p, p_prev) = legendre_pair(n, z);
            derivative = nf * (z * p - p_prev) / (z * z - 1.0);
            let step = p / derivative;
            z -= step;
            if step.abs() <= TOLERANCE {
                break;
            }
        }

        nodes[i] = -z;
        nodes[n - 1 - i] = z;
        // Standard weight 2 / ((1 - z^2) P'^2), halved for the uniform density.
        let w = 1.0 / ((1.0 - z * z) * derivative * derivative);
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    QuadratureRule { nodes, weights }
}

/// `P_n(z)` and `P_{n-1}(z)` by recurrence.
fn legendre_pair(n: usize, z: f64) -> (f64, f64) {
    let mut p = 1.0;
    let mut p_prev = 0.0;
    for j in 0..n {
        let jf = j as f64;
        let next = ((2.0 * jf + 1.0) * z * p - jf * p_prev) / (jf + 1.0);
        p_prev = p;
        p = next;
    }
    (p, p_prev)
}

/// `n`-point Gauss–Hermite rule for the standard normal density, nodes ascending.
pub fn gauss_hermite(n: usize) -> QuadratureRule {
    // Roots of the physicists' Hermite polynomials (weight exp(-x^2)),
    // rescaled to the standard normal at the end.
    const PI_M4: f64 = 0.751_125_544_464_942_5;

    let mut roots = vec![0.0; n];
    let mut raw_weights = vec![0.0; n];
    let nf = n as f64;
    let mut z = 0.0_f64;

    for i in 0..n.div_ceil(2) {
        z = match i {
            0 => (2.0 * nf + 1.0).sqrt() - 1.855_75 * (2.0 * nf + 1.0).powf(-0.166_67),
            1 => z - 1.14 * nf.powf(0.426) / z,
            2 => 1.86 * z - 0.86 * roots[0],
            3 => 1.91 * z - 0.91 * roots[1],
            _ => 2.0 * z - roots[i - 2],
        };

        let mut derivative = 1.0;
        for _ in 0..MAX_ITERATIONS {
            let mut p1 = PI_M4;
            let mut p2 = 0.0;
            for j in 0..n {
                let jf = j as f64;
                let p3 = p2;
                p2 = p1;
                p1 = z * (2.0 / (jf + 1.0)).sqrt() * p2 - (jf / (jf + 1.0)).sqrt() * p3;
            }
            derivative = (2.0 * nf).sqrt() * p2;
            let step = p1 / derivative;
            z -= step;
            if step.abs() <= TOLERANCE {
                break;
            }
        }

        roots[i] = z;
        roots[n - 1 - i] = -z;
        raw_weights[i] = 2.0 / (derivative * derivative);
        raw_weights[n - 1 - i] = raw_weights[i];
    }

    // roots[] is descending; flip to ascending while rescaling.
    let sqrt_pi = PI.sqrt();
    let nodes = roots.iter().rev().map(|x| x * std::f64::consts::SQRT_2).collect();
    let weights = raw_weights.iter().rev().map(|w| w / sqrt_pi).collect();
    QuadratureRule { nodes, weights }
}

/// Full tensor product of one rule per dimension, last dimension varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorGrid {
    pub nodes: Vec<Vec<f64>>,
    pub weights: Vec<f64>,
}

impl TensorGrid {
    pub fn new(rules: &[QuadratureRule]) -> Self {
        let shape: Vec<usize> = rules.iter().map(QuadratureRule::len).collect();
        let total: usize = if rules.is_empty() {
            0
        } else {
            shape.iter().product()
        };

        let mut nodes = Vec::with_capacity(total);
        let mut weights = Vec::with_capacity(total);
        let mut index = vec![0usize; rules.len()];

        for _ in 0..total {
            nodes.push(
                rules
                    .iter()
                    .zip(&index)
                    .map(|(rule, &k)| rule.nodes[k])
                    .collect(),
            );
            weights.push(
                rules
                    .iter()
                    .zip(&index)
                    .map(|(rule, &k)| rule.weights[k])
                    .product(),
            );

            for dim in (0..index.len()).rev() {
                index[dim] += 1;
                if index[dim] < shape[dim] {
                    break;
                }
                index[dim] = 0;
            }
        }

        Self { nodes, weights }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
