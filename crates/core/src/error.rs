//! Error types for anthrome

use thiserror::Error;

/// Main error type for anthrome operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid dimensions: {cols}x{rows}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("Index out of bounds: ({row}, {col}) in grid of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Grid shape mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    ShapeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Layer '{key}' could not be loaded: {reason}")]
    LayerNotFound { key: String, reason: String },

    #[error("Missing {layer} layer for year {year}")]
    MissingLayer {
        year: i32,
        layer: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Category code {code} is outside the valid range 0..{limit}")]
    CodeOutOfRange { code: u16, limit: u16 },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Run cancelled before stage '{stage}'")]
    Cancelled { stage: &'static str },

    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap this error with the name of the pipeline stage it aborted.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            // Cancellation already names its stage.
            Error::Cancelled { .. } | Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}

/// Result type alias for anthrome operations
pub type Result<T> = std::result::Result<T, Error>;
