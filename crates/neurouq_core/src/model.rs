//! Model call contract and the shape of its output.

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::parameters::Sample;

/// Numeric output of a model or feature: 0-D, 1-D or higher-dimensional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Scalar(f64),
    Series(Vec<f64>),
    /// Two or more dimensions, row-major.
    Array { shape: Vec<usize>, data: Vec<f64> },
}

impl Response {
    /// Build an array response, collapsing to `Scalar`/`Series` for fewer than two axes.
    pub fn array(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, SimulationError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(SimulationError::MalformedResponse {
                shape,
                len: data.len(),
            });
        }
        Ok(match shape.len() {
            0 => Response::Scalar(data[0]),
            1 => Response::Series(data),
            _ => Response::Array { shape, data },
        })
    }

    /// Stack equal-length rows into a 2-D response.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, SimulationError> {
        let cols = rows.first().map_or(0, Vec::len);
        let shape = vec![rows.len(), cols];
        let data: Vec<f64> = rows.into_iter().flatten().collect();
        Self::array(shape, data)
    }

    pub fn ndim(&self) -> usize {
        match self {
            Response::Scalar(_) => 0,
            Response::Series(_) => 1,
            Response::Array { shape, .. } => shape.len(),
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            Response::Scalar(_) => Vec::new(),
            Response::Series(values) => vec![values.len()],
            Response::Array { shape, .. } => shape.clone(),
        }
    }

    /// Flat row-major view of all values.
    pub fn values(&self) -> &[f64] {
        match self {
            Response::Scalar(value) => std::slice::from_ref(value),
            Response::Series(values) => values,
            Response::Array { data, .. } => data,
        }
    }

    pub fn into_values(self) -> Vec<f64> {
        match self {
            Response::Scalar(value) => vec![value],
            Response::Series(values) => values,
            Response::Array { data, .. } => data,
        }
    }

    /// Length of the leading axis, `None` for scalars.
    pub fn leading_len(&self) -> Option<usize> {
        match self {
            Response::Scalar(_) => None,
            Response::Series(values) => Some(values.len()),
            Response::Array { shape, .. } => shape.first().copied(),
        }
    }
}

impl From<f64> for Response {
    fn from(value: f64) -> Self {
        Response::Scalar(value)
    }
}

impl From<Vec<f64>> for Response {
    fn from(values: Vec<f64>) -> Self {
        Response::Series(values)
    }
}

/// Direct output of one model invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub time: Option<Vec<f64>>,
    pub response: Response,
}

impl RawResult {
    pub fn new(time: Option<Vec<f64>>, response: Response) -> Result<Self, SimulationError> {
        let result = Self { time, response };
        result.validate()?;
        Ok(result)
    }

    /// A time axis, when present, must be finite and match the response's
    /// leading dimension.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if let Some((index, &value)) = self
            .time
            .iter()
            .flatten()
            .enumerate()
            .find(|(_, t)| !t.is_finite())
        {
            return Err(SimulationError::NonFiniteTime { index, value });
        }
        if let Response::Array { shape, data } = &self.response
            && shape.iter().product::<usize>() != data.len()
        {
            return Err(SimulationError::MalformedResponse {
                shape: shape.clone(),
                len: data.len(),
            });
        }
        if let (Some(time), Some(response_len)) = (&self.time, self.response.leading_len())
            && time.len() != response_len
        {
            return Err(SimulationError::TimeAxisMismatch {
                time_len: time.len(),
                response_len,
            });
        }
        Ok(())
    }
}

/// A simulation that maps one parameter vector to a [`RawResult`].
///
/// Implementations are called concurrently from the worker pool and must not
/// keep mutable per-call state.
pub trait Model: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, sample: &Sample) -> Result<RawResult, SimulationError>;

    /// True when the time axis may differ from run to run, so outputs need
    /// resampling onto a shared grid.
    fn adaptive(&self) -> bool {
        false
    }
}

/// Adapter turning a closure into a [`Model`].
pub struct FnModel<F> {
    name: String,
    adaptive: bool,
    f: F,
}

impl<F> FnModel<F>
where
    F: Fn(&Sample) -> Result<RawResult, SimulationError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            adaptive: false,
            f,
        }
    }

    pub fn adaptive(mut self) -> Self {
        self.adaptive = true;
        self
    }
}

impl<F> Model for FnModel<F>
where
    F: Fn(&Sample) -> Result<RawResult, SimulationError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, sample: &Sample) -> Result<RawResult, SimulationError> {
        (self.f)(sample)
    }

    fn adaptive(&self) -> bool {
        self.adaptive
    }
}
