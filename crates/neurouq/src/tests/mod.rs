//! End-to-end tests of the subcommands
//!
//! Test modules:
//! - `commands`: run, explore and inspect against a temporary output directory
