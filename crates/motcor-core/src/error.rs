//! Error types for motion quantification.
//!
//! This module provides structured error types shared by every stage of
//! the pipeline, enabling better error handling and debugging.

use thiserror::Error;

/// Main error type for motion quantification operations.
#[derive(Error, Debug)]
pub enum MotionError {
    /// A required volume, mask, or reference file is missing or unreadable.
    #[error("Input error: {0}")]
    Input(String),

    /// Invalid or conflicting configuration options.
    #[error("Argument error: {0}")]
    Argument(String),

    /// A numerical invariant was violated: frame-count mismatch,
    /// non-rigid or non-invertible transform, duplicate frame index.
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type for motion quantification operations.
pub type Result<T> = std::result::Result<T, MotionError>;

impl MotionError {
    /// Create an input error.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Create an argument error.
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    /// Create a computation error.
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }
}
