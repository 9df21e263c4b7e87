//! Per-quantity response matrices assembled from node records.

use serde::{Deserialize, Serialize};

use crate::error::{ConsistencyError, SimulationError};
use crate::evaluate::NodeRecord;
use crate::features::FeatureOutput;

/// All valid rows of one quantity, aligned column-wise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityEnsemble {
    pub name: String,
    /// Time axis of the first valid row.
    pub time: Option<Vec<f64>>,
    /// Response shape shared by every row.
    pub shape: Vec<usize>,
    /// Flattened responses; `rows[k]` came from sample `sample_indices[k]`.
    pub rows: Vec<Vec<f64>>,
    pub sample_indices: Vec<usize>,
    /// Samples whose output was invalid or whose model call failed.
    pub excluded: Vec<usize>,
}

impl QuantityEnsemble {
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    /// Width of a flattened row.
    pub fn points(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Result of one sweep: assembled quantities plus what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    /// Quantities in record order, direct comparison first.
    pub quantities: Vec<QuantityEnsemble>,
    /// Quantities dropped during assembly.
    pub failures: Vec<ConsistencyError>,
    /// Model failures by sample index.
    pub failed_samples: Vec<(usize, SimulationError)>,
    pub sample_count: usize,
}

impl Ensemble {
    /// Assemble index-ordered records, one quantity at a time.
    ///
    /// A quantity whose valid rows disagree on dimensionality or shape, or
    /// that has no valid rows at all, is dropped into `failures` while the
    /// other quantities are kept.
    pub fn assemble(records: &[NodeRecord], names: &[String]) -> Self {
        let mut quantities = Vec::with_capacity(names.len());
        let mut failures = Vec::new();

        for name in names {
            match assemble_quantity(records, name) {
                Ok(quantity) => quantities.push(quantity),
                Err(error) => {
                    tracing::warn!(%error, "dropping quantity");
                    failures.push(error);
                }
            }
        }

        let failed_samples = records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.failure.clone().map(|e| (i, e)))
            .collect();

        Self {
            quantities,
            failures,
            failed_samples,
            sample_count: records.len(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&QuantityEnsemble> {
        self.quantities.iter().find(|q| q.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.quantities.iter().map(|q| q.name.as_str()).collect()
    }
}

fn assemble_quantity(records: &[NodeRecord], name: &str) -> Result<QuantityEnsemble, ConsistencyError> {
    let mut time = None;
    let mut shape: Option<Vec<usize>> = None;
    let mut rows = Vec::new();
    let mut sample_indices = Vec::new();
    let mut excluded = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let Some(FeatureOutput::Valid {
            time: row_time,
            response,
        }) = record.get(name)
        else {
            excluded.push(index);
            continue;
        };

        let row_shape = response.shape();
        match &shape {
            None => {
                time = row_time.clone();
                shape = Some(row_shape);
            }
            Some(first) if first.len() != row_shape.len() => {
                return Err(ConsistencyError::MixedDimensionality {
                    quantity: name.to_string(),
                    first: first.len(),
                    other: row_shape.len(),
                });
            }
            Some(first) if *first != row_shape => {
                return Err(ConsistencyError::MixedShape {
                    quantity: name.to_string(),
                    first: first.clone(),
                    other: row_shape,
                });
            }
            Some(_) => {}
        }

        rows.push(response.values().to_vec());
        sample_indices.push(index);
    }

    let Some(shape) = shape else {
        return Err(ConsistencyError::NoValidSamples {
            quantity: name.to_string(),
        });
    };

    Ok(QuantityEnsemble {
        name: name.to_string(),
        time,
        shape,
        rows,
        sample_indices,
        excluded,
    })
}
