//! Uncertainty statistics per quantity and the views plotting code reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError, UnsupportedDimensionalityError, UqError};
use crate::sampling::Scheme;

/// Whether data was just computed or restored from storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    #[default]
    Computed,
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    Variance,
    Percentile5,
    Percentile95,
}

impl Statistic {
    pub const ALL: [Statistic; 4] = [
        Statistic::Mean,
        Statistic::Variance,
        Statistic::Percentile5,
        Statistic::Percentile95,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Variance => "variance",
            Statistic::Percentile5 => "percentile_5",
            Statistic::Percentile95 => "percentile_95",
        }
    }
}

/// Statistics of one quantity, flattened row-major for 2-D and above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityStatistics {
    pub time: Option<Vec<f64>>,
    pub shape: Vec<usize>,
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
    pub percentile_5: Vec<f64>,
    pub percentile_95: Vec<f64>,
    /// First-order indices, `[parameter][point]`; absent when undefined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<Vec<Vec<f64>>>,
    /// Samples that contributed.
    pub evaluated: usize,
    /// Samples left out because the output was invalid or the model failed.
    pub excluded: usize,
}

impl QuantityStatistics {
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn statistic(&self, statistic: Statistic) -> &[f64] {
        match statistic {
            Statistic::Mean => &self.mean,
            Statistic::Variance => &self.variance,
            Statistic::Percentile5 => &self.percentile_5,
            Statistic::Percentile95 => &self.percentile_95,
        }
    }

    fn require_ndim(
        &self,
        name: &str,
        operation: &'static str,
        supported: usize,
    ) -> std::result::Result<(), UnsupportedDimensionalityError> {
        if self.ndim() == supported {
            Ok(())
        } else {
            Err(UnsupportedDimensionalityError {
                quantity: name.to_string(),
                operation,
                supported,
                actual: self.ndim(),
            })
        }
    }
}

/// A quantity whose statistics could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityFailure {
    pub quantity: String,
    pub reason: String,
}

/// 1-D view ready for plotting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesView<'a> {
    pub time: Option<&'a [f64]>,
    pub values: &'a [f64],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyData {
    pub name: String,
    pub scheme: Scheme,
    /// Canonical parameter order for every sensitivity array.
    pub uncertain_parameters: Vec<String>,
    pub quantities: BTreeMap<String, QuantityStatistics>,
    pub features_0d: Vec<String>,
    pub features_1d: Vec<String>,
    #[serde(default)]
    pub failures: Vec<QuantityFailure>,
    pub sample_count: usize,
    pub failed_samples: usize,
    #[serde(default)]
    pub origin: DataOrigin,
}

impl UncertaintyData {
    pub fn new(
        name: impl Into<String>,
        scheme: Scheme,
        uncertain_parameters: Vec<String>,
        sample_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            scheme,
            uncertain_parameters,
            quantities: BTreeMap::new(),
            features_0d: Vec::new(),
            features_1d: Vec::new(),
            failures: Vec::new(),
            sample_count,
            failed_samples: 0,
            origin: DataOrigin::Computed,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.origin == DataOrigin::Loaded
    }

    pub fn get(&self, name: &str) -> Result<&QuantityStatistics> {
        self.quantities
            .get(name)
            .ok_or_else(|| UqError::UnknownQuantity(name.to_string()))
    }

    /// Split quantity names into 0-D and 1-D buckets from their shapes.
    ///
    /// Higher-dimensional quantities fall in neither bucket.
    pub fn classify(&self) -> (Vec<String>, Vec<String>) {
        let mut zero = Vec::new();
        let mut one = Vec::new();
        for (name, stats) in &self.quantities {
            match stats.ndim() {
                0 => zero.push(name.clone()),
                1 => one.push(name.clone()),
                ndim => {
                    tracing::warn!(quantity = %name, ndim, "no support for more than 0d and 1d plotting");
                }
            }
        }
        (zero, one)
    }

    /// Recompute the stored classification from the current quantities.
    pub fn reclassify(&mut self) {
        let (zero, one) = self.classify();
        self.features_0d = zero;
        self.features_1d = one;
    }

    /// One statistic of a 1-D quantity along its time axis.
    pub fn series(&self, name: &str, statistic: Statistic) -> Result<SeriesView<'_>> {
        let stats = self.get(name)?;
        stats.require_ndim(name, "series view", 1)?;
        Ok(SeriesView {
            time: stats.time.as_deref(),
            values: stats.statistic(statistic),
        })
    }

    /// One statistic of a 0-D quantity.
    pub fn scalar(&self, name: &str, statistic: Statistic) -> Result<f64> {
        let stats = self.get(name)?;
        stats.require_ndim(name, "scalar view", 0)?;
        stats.statistic(statistic).first().copied().ok_or_else(|| {
            StorageError::ShapeMismatch {
                quantity: name.to_string(),
                field: statistic.label(),
                expected: 1,
                actual: 0,
            }
            .into()
        })
    }

    /// First-order indices paired with parameter names, for 0-D and 1-D quantities.
    pub fn sensitivity(&self, name: &str) -> Result<Option<Vec<(&str, &[f64])>>> {
        let stats = self.get(name)?;
        if stats.ndim() > 1 {
            return Err(UnsupportedDimensionalityError {
                quantity: name.to_string(),
                operation: "sensitivity view",
                supported: 1,
                actual: stats.ndim(),
            }
            .into());
        }
        Ok(stats.sensitivity.as_ref().map(|rows| {
            self.uncertain_parameters
                .iter()
                .map(String::as_str)
                .zip(rows.iter().map(Vec::as_slice))
                .collect()
        }))
    }
}
