//! Run configuration and the explicit context handed to each run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

pub const DEFAULT_SEED: u64 = 10;

/// Policy for the canonical time grid of 1-D quantities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGrid {
    /// Resample onto the first valid sample's axis only for adaptive models.
    #[default]
    Auto,
    /// Always resample onto the first valid sample's axis.
    FirstSample,
    /// Resample every 1-D quantity that carries a time axis onto this grid.
    Fixed(Vec<f64>),
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Worker threads, `None` for available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub grid: TimeGrid,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Wall-clock limit for the sample sweep.
    #[serde(default)]
    pub timeout_secs: Option<f64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: None,
            grid: TimeGrid::Auto,
            seed: DEFAULT_SEED,
            timeout_secs: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.workers == Some(0) {
            return Err(ConfigurationError::InvalidRunConfig(
                "workers must be positive".into(),
            ));
        }
        if let Some(t) = self.timeout_secs
            && !(t.is_finite() && t > 0.0)
        {
            return Err(ConfigurationError::InvalidRunConfig(format!(
                "timeout must be positive, got {t}"
            )));
        }
        if let TimeGrid::Fixed(grid) = &self.grid {
            if grid.is_empty() {
                return Err(ConfigurationError::InvalidRunConfig(
                    "fixed time grid is empty".into(),
                ));
            }
            if grid.windows(2).any(|w| w[1] <= w[0]) {
                return Err(ConfigurationError::InvalidRunConfig(
                    "fixed time grid must be strictly increasing".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs_f64)
    }
}

/// Shared progress and cancellation handle for one run.
///
/// Clones share the same counters, so a caller can keep one and cancel
/// from another thread while the run is in flight.
#[derive(Debug, Clone)]
pub struct RunControl {
    /// Completed samples
    completed: Arc<AtomicUsize>,
    /// Samples dispatched in the current run
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl RunControl {
    #[must_use]
    pub fn new() -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a run needs besides its model, features and samples.
///
/// Replaces process-wide logger and configuration state: the name tags
/// every log line of the run through [`RunContext::span`].
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub name: String,
    pub config: RunConfig,
    pub control: RunControl,
}

impl RunContext {
    pub fn new(name: impl Into<String>, config: RunConfig) -> Self {
        Self {
            name: name.into(),
            config,
            control: RunControl::new(),
        }
    }

    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("uq_run", name = %self.name)
    }

    /// Deadline measured from `start`, if a timeout is configured.
    pub(crate) fn deadline(&self, start: Instant) -> Option<Instant> {
        self.config.timeout().map(|t| start + t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_defaults_from_partial_json() {
        let config: RunConfig = serde_json::from_str(r#"{"workers": 2}"#).unwrap();
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.grid, TimeGrid::Auto);
        assert!(config.timeout().is_none());

        let config: RunConfig = serde_json::from_str(r#"{"grid": {"fixed": [0.0, 1.0]}}"#).unwrap();
        assert_eq!(config.grid, TimeGrid::Fixed(vec![0.0, 1.0]));
    }

    #[test]
    fn test_run_config_validation() {
        assert!(RunConfig::default().validate().is_ok());
        let bad = RunConfig {
            workers: Some(0),
            ..RunConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = RunConfig {
            grid: TimeGrid::Fixed(vec![0.0, 0.0]),
            ..RunConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = RunConfig {
            timeout_secs: Some(-1.0),
            ..RunConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_control_is_shared_between_clones() {
        let control = RunControl::new();
        let handle = control.clone();
        control.reset(4);
        handle.increment();
        handle.cancel();
        assert_eq!(control.completed(), 1);
        assert_eq!(control.total(), 4);
        assert!(control.is_cancelled());
    }
}
