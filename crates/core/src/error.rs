//! Error types for contorno

use thiserror::Error;

/// Main error type for contorno operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Raster grids are not aligned: geotransforms differ")]
    TransformMismatch,

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// The region of interest holds no valid elevation data, so no contour
    /// levels can be derived.
    #[error("No data in region of interest: no elevation features to derive a range from")]
    EmptyRegion,

    /// The vectorization window cannot be brought under the cell budget.
    #[error("Cell budget exceeded: {cells} cells requested, budget is {budget}")]
    ResourceBudgetExceeded { cells: usize, budget: usize },

    /// Extraction of a single contour level failed; the composite is abandoned.
    #[error("Contour extraction failed at level {level}: {reason}")]
    ExtractionFailed { level: f64, reason: String },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidParameter`].
    pub fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for contorno operations
pub type Result<T> = std::result::Result<T, Error>;
