//! Integration tests for the propagation pipeline
//!
//! Tests are organized by topic:
//! - `propagation` - End-to-end statistics on the testing models
//! - `failures` - Per-sample model failures and exclusion bookkeeping
//! - `dimensionality` - Consistency errors and dimensionality-restricted views
//! - `persistence` - Save/load round trips of computed data
//! - `exploration` - Multi-scenario runs

mod failures;
mod persistence;
