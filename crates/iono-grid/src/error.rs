//! Error types for regridding and integration.

use thiserror::Error;

/// Errors that can occur while regridding or integrating a model grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// A coordinate axis is empty, non-finite, or not monotonic.
    #[error("invalid axis: {0}")]
    InvalidAxis(String),

    /// A field does not have the shape of the grid it is paired with.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// The target altitude grid is empty or not increasing.
    #[error("invalid altitude range: {0}")]
    InvalidAltitudeRange(String),

    /// An integration bound pair describes a zero-length range.
    #[error("empty {axis} range: [{min}, {max}]")]
    EmptyRange {
        axis: &'static str,
        min: usize,
        max: usize,
    },

    /// An index lies past the end of the dimension it addresses.
    #[error("{axis} index {index} is out of range for length {len}")]
    BoundsOutOfRange {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    /// A NaN or infinite sample was found where it is not tolerated.
    #[error("non-finite value {value} at [{t}, {k}, {lat}, {lon}]")]
    NonFiniteInput {
        value: f64,
        t: usize,
        k: usize,
        lat: usize,
        lon: usize,
    },

    /// The data provider does not hold the requested field.
    #[error("field not available: {0}")]
    MissingField(String),

    /// A field name did not match any known field.
    #[error("unknown field name: {0}")]
    UnknownField(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GridError {
    /// Create an InvalidAxis error.
    pub fn invalid_axis(msg: impl Into<String>) -> Self {
        Self::InvalidAxis(msg.into())
    }

    /// Create a ShapeMismatch error from two array shapes.
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Create an InvalidAltitudeRange error.
    pub fn invalid_altitude_range(msg: impl Into<String>) -> Self {
        Self::InvalidAltitudeRange(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
