//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur during regression testing
#[derive(Debug, Error)]
pub enum TestError {
    /// Fixture construction failed
    #[error("failed to build fixture '{name}': {message}")]
    Fixture { name: String, message: String },

    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] mrcseg_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
