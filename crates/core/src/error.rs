//! Error types for lakeflat

use thiserror::Error;

/// Main error type for lakeflat operations
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

    #[error("Rasters are not on a common grid: {0}")]
    GridMismatch(String),

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Vector data error: {0}")]
    Vector(String),

    #[error("Field '{0}' not found in any feature")]
    MissingField(String),

    #[error("Layer contains no polygon features")]
    EmptyLayer,

    #[error("No valid elevation data inside lake '{lake}'")]
    NoValidElevation { lake: String },

    #[error("Profiling the boundary of lake '{lake}' produced no samples")]
    NoBoundarySamples { lake: String },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::Vector(e.to_string())
    }
}

/// Result type alias for lakeflat operations
pub type Result<T> = std::result::Result<T, Error>;
