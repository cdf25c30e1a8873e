//! Error types for grid dataset operations.

use thiserror::Error;

/// Result type for grid dataset operations.
pub type GridResult<T> = Result<T, GridError>;

/// Error types for loading and querying gridded forecast data.
#[derive(Error, Debug)]
pub enum GridError {
    /// The backing file could not be opened or read
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    /// A requested variable is not present in the dataset
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// A variable declares units other than the ones the caller accepts
    #[error("Unit mismatch for {variable}: expected one of {expected:?}, found '{found}'")]
    UnitMismatch {
        variable: String,
        expected: Vec<String>,
        found: String,
    },

    /// A requested region does not overlap the grid
    #[error(
        "Region lat [{bottom}, {top}] lon [{left}, {right}] is outside the grid domain"
    )]
    OutOfDomain {
        bottom: f64,
        top: f64,
        left: f64,
        right: f64,
    },

    /// A coordinate axis is too short, non-finite or not strictly monotonic
    #[error("Invalid axis '{axis}': {reason}")]
    InvalidAxis { axis: String, reason: String },

    /// Data layout or metadata could not be interpreted
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GridError {
    pub fn invalid_axis(axis: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAxis {
            axis: axis.into(),
            reason: reason.into(),
        }
    }

    pub fn source_unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable code for structured error reporting.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } | Self::Io(_) => "SOURCE_UNAVAILABLE",
            Self::UnknownVariable(_) => "UNKNOWN_VARIABLE",
            Self::UnitMismatch { .. } => "UNIT_MISMATCH",
            Self::OutOfDomain { .. } => "OUT_OF_DOMAIN",
            Self::InvalidAxis { .. } | Self::InvalidFormat(_) => "INVALID_GRID",
        }
    }
}
