//! Error types for mrcseg-cos

use thiserror::Error;

/// Errors that can occur during block segmentation
#[derive(Debug, Error)]
pub enum CosError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] mrcseg_core::Error),

    /// Block size is not a positive multiple of 4
    #[error("block size must be a positive multiple of 4, got {0}")]
    InvalidBlockSize(u32),

    /// A coarser layer does not match the image being segmented
    #[error("coarse layer mismatch: {0}")]
    CoarseMismatch(String),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for block segmentation operations
pub type CosResult<T> = Result<T, CosError>;
