//! Error types for mrcseg-core
//!
//! Provides a unified error type for all operations in the core crate.
//! Each variant captures enough context for diagnostics without exposing
//! internal implementation details.

use thiserror::Error;

/// mrcseg core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid image dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Invalid pixel depth
    #[error("invalid pixel depth: {0} bpp")]
    InvalidDepth(u32),

    /// Unsupported pixel depth for this operation
    #[error("unsupported pixel depth: expected {expected}, got {actual} bpp")]
    UnsupportedDepth { expected: &'static str, actual: u32 },

    /// Unsupported number of samples per pixel
    #[error("unsupported channel count: expected {expected}, got {actual}")]
    UnsupportedChannels { expected: u32, actual: u32 },

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Image dimension mismatch
    #[error("dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Raw buffer length does not match the declared geometry
    #[error("buffer length mismatch: expected {expected} bytes, got {actual}")]
    BufferLength { expected: usize, actual: usize },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unsupported `image` crate buffer layout
    #[error("unsupported image layout: {0}")]
    UnsupportedLayout(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
