//! Error types for mrcseg-ccc

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during component classification
#[derive(Debug, Error)]
pub enum CccError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] mrcseg_core::Error),

    /// Region extraction error
    #[error("region error: {0}")]
    Region(#[from] mrcseg_region::RegionError),

    /// The model file could not be read
    #[error("cannot read model file {path}: {source}")]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed model text
    #[error("model parse error at line {line}: {message}")]
    ModelParse { line: usize, message: String },

    /// Model band count differs from the feature dimensionality
    #[error("band count mismatch: features have {expected} bands, model has {actual}")]
    BandMismatch { expected: usize, actual: usize },

    /// A subclass covariance cannot be inverted
    #[error("singular covariance in class {class}, subclass {subclass}")]
    SingularCovariance { class: usize, subclass: usize },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for component classification operations
pub type CccResult<T> = Result<T, CccError>;
