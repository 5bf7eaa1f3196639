//! Common error types for the bundle image pipeline

use thiserror::Error;

/// Common result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an operation.
///
/// Per-product lookup misses are not errors: the resolver folds any
/// non-success response into a "not found" for that suffix and the
/// orchestrator records the miss. Only faults that make an operation
/// impossible (bad input table, I/O, packaging) surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// Input table rejected before any processing (missing columns, empty)
    #[error("Validation error: {0}")]
    Validation(String),

    /// CSV read/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode or transform error (wraps image::ImageError)
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Archive packaging error (wraps zip::result::ZipError)
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
