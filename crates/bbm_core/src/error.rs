//! Import error type.

use thiserror::Error;

/// Errors that can occur while importing a model.
///
/// An import is all-or-nothing: any of these aborts it and no partially
/// built objects are returned.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Geometry not found (tried: {})", .attempted.join(", "))]
    GeometryNotFound { attempted: Vec<String> },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// An internal reference between builder tables did not resolve.
    /// Well-formed input never produces this.
    #[error("Dangling reference: {0}")]
    DanglingReference(String),
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;
