//! Error types for regional reduction.

use forecast_grid::GridError;
use thiserror::Error;

use crate::weights::GeometryError;

/// Errors that can occur while reducing gridded data over polygon regions.
#[derive(Error, Debug)]
pub enum ReducerError {
    /// Grid dataset error (missing variable, unit mismatch, out of domain, ...).
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The requested reducer is not registered.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// The unique field is missing, not an identifier type, or not unique.
    #[error("unknown unique field '{field}': {reason}")]
    UnknownUniqueField { field: String, reason: String },

    /// Weight computation failed for a polygon; the whole batch is aborted.
    #[error("geometry error for polygon '{polygon}': {source}")]
    Geometry {
        polygon: String,
        #[source]
        source: GeometryError,
    },

    /// Window counts or index pairs are invalid for the time axis.
    #[error("invalid window spec: {0}")]
    InvalidWindowSpec(String),

    /// A weight grid does not match the cropped data slice.
    #[error("shape mismatch: weights {weights:?}, data {data:?}")]
    ShapeMismatch {
        weights: (usize, usize),
        data: (usize, usize),
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The worker pool could not be started.
    #[error("worker pool error: {0}")]
    WorkerPool(String),
}

impl ReducerError {
    /// Create an UnknownUniqueField error.
    pub fn unknown_unique_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnknownUniqueField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidWindowSpec error.
    pub fn invalid_window(msg: impl Into<String>) -> Self {
        Self::InvalidWindowSpec(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable machine-readable code for the surrounding service layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Grid(err) => err.code(),
            Self::UnknownParameter(_) => "UNKNOWN_PARAMETER",
            Self::UnknownUniqueField { .. } => "UNKNOWN_UNIQUE_FIELD",
            Self::Geometry { .. } => "GEOMETRY_ERROR",
            Self::InvalidWindowSpec(_) => "INVALID_WINDOW_SPEC",
            Self::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            Self::Config(_) => "CONFIG_ERROR",
            Self::WorkerPool(_) => "WORKER_POOL_ERROR",
        }
    }
}

impl From<serde_yaml::Error> for ReducerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for reducer operations.
pub type Result<T> = std::result::Result<T, ReducerError>;
