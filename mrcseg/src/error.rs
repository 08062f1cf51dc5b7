//! Error types for the mrcseg driver

use thiserror::Error;

/// Errors that can occur during multiscale segmentation
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] mrcseg_core::Error),

    /// Block segmentation error
    #[error("block segmentation error: {0}")]
    Cos(#[from] mrcseg_cos::CosError),

    /// Component classification error
    #[error("component classification error: {0}")]
    Ccc(#[from] mrcseg_ccc::CccError),

    /// Image has no pixels
    #[error("empty image: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// Block size is not a positive multiple of 4
    #[error("block size must be a positive multiple of 4, got {0}")]
    InvalidBlockSize(u32),

    /// No layer fits the image
    #[error("no layer of block size {block_size} fits a {width}x{height} image")]
    NoLayers {
        width: u32,
        height: u32,
        block_size: u32,
    },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for multiscale segmentation
pub type SegmentResult<T> = Result<T, SegmentError>;
