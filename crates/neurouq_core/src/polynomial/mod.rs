//! Polynomial chaos: quadrature rules, orthonormal basis and expansion fitting.

mod basis;
mod expansion;
mod quadrature;

pub use basis::{Basis, orthonormal_values, total_degree_indices};
pub use expansion::Expansion;
pub use quadrature::{QuadratureRule, TensorGrid, gauss_hermite, gauss_legendre};
pub(crate) use expansion::vanishing;
