//! Command-line driver for neuron-model uncertainty quantification
//!
//! This crate wires concrete models into `neurouq_core`:
//! - Izhikevich and coffee-cup models with default parameter uncertainty
//! - YAML exploration files describing scenario studies
//! - CSV export of 0-D and 1-D statistics
//! - Logging setup for the native binary

// ============================================================================
// Core modules
// ============================================================================

pub mod commands;
pub mod exploration_file;
#[cfg(feature = "native")]
pub mod logging;
pub mod models;
pub mod report;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use commands::{RunOptions, RunOutput, SchemeKind};
pub use exploration_file::ExplorationFile;
#[cfg(feature = "native")]
pub use logging::init_logging;
pub use models::{CoffeeCup, Izhikevich, ModelKind};
pub use report::Summary;
