use thiserror::Error;

/// Malformed distribution, parameter set, feature set or scheme input.
///
/// Raised before any sampling begins and never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("invalid {kind} distribution parameters ({detail}): {reason}")]
    InvalidDistribution {
        kind: &'static str,
        detail: String,
        reason: &'static str,
    },
    #[error("duplicate parameter name `{0}`")]
    DuplicateParameter(String),
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("expected {expected} node coordinates, got {actual}")]
    CoordinateCount { expected: usize, actual: usize },
    #[error("no uncertain parameters in parameter set")]
    NoUncertainParameters,
    #[error("duplicate feature name `{0}`")]
    DuplicateFeature(String),
    #[error("unknown feature `{0}`")]
    UnknownFeature(String),
    #[error("invalid sampling scheme: {0}")]
    InvalidScheme(String),
    #[error("invalid run configuration: {0}")]
    InvalidRunConfig(String),
}

/// One model invocation failed. Isolated to its sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("model `{model}` failed: {reason}")]
    Failed { model: String, reason: String },
    #[error("time axis has {time_len} points but response leading dimension is {response_len}")]
    TimeAxisMismatch {
        time_len: usize,
        response_len: usize,
    },
    #[error("response shape {shape:?} does not match {len} data values")]
    MalformedResponse { shape: Vec<usize>, len: usize },
    #[error("time axis value {value} at index {index} is not finite")]
    NonFiniteTime { index: usize, value: f64 },
}

/// Cross-sample inconsistency for a single quantity.
///
/// Aborts aggregation of that quantity only; sibling quantities continue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("quantity `{quantity}` has mixed dimensionality across samples ({first}-D and {other}-D)")]
    MixedDimensionality {
        quantity: String,
        first: usize,
        other: usize,
    },
    #[error("quantity `{quantity}` has mixed response shapes across samples ({first:?} and {other:?})")]
    MixedShape {
        quantity: String,
        first: Vec<usize>,
        other: Vec<usize>,
    },
    #[error("quantity `{quantity}` has no valid samples")]
    NoValidSamples { quantity: String },
    #[error("quantity `{quantity}` has {valid} valid samples but the expansion needs {required}")]
    InsufficientSamples {
        quantity: String,
        valid: usize,
        required: usize,
    },
    #[error("quantity `{quantity}`: least-squares system is singular")]
    SingularFit { quantity: String },
}

impl ConsistencyError {
    /// Name of the quantity this failure belongs to.
    pub fn quantity(&self) -> &str {
        match self {
            ConsistencyError::MixedDimensionality { quantity, .. }
            | ConsistencyError::MixedShape { quantity, .. }
            | ConsistencyError::NoValidSamples { quantity }
            | ConsistencyError::InsufficientSamples { quantity, .. }
            | ConsistencyError::SingularFit { quantity } => quantity,
        }
    }
}

/// A statistic or view was requested for a quantity of the wrong dimensionality.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{operation} supports {supported}-D quantities, `{quantity}` is {actual}-D")]
pub struct UnsupportedDimensionalityError {
    pub quantity: String,
    pub operation: &'static str,
    pub supported: usize,
    pub actual: usize,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize uncertainty data: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to parse uncertainty data: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("quantity `{0}` has non-finite statistics and cannot be stored as JSON")]
    NonFinite(String),
    #[error("stored {bucket} classification {stored:?} does not match derived {derived:?}")]
    ClassificationMismatch {
        bucket: &'static str,
        stored: Vec<String>,
        derived: Vec<String>,
    },
    #[error("quantity `{quantity}`: {field} holds {actual} values, shape needs {expected}")]
    ShapeMismatch {
        quantity: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Umbrella error for orchestration entry points.
#[derive(Debug, Error)]
pub enum UqError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    UnsupportedDimensionality(#[from] UnsupportedDimensionalityError),
    #[error("unknown quantity `{0}`")]
    UnknownQuantity(String),
    #[error("run cancelled")]
    Cancelled,
    #[error("run exceeded its timeout")]
    TimedOut,
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, UqError>;
