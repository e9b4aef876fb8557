//! Error types for the polyhedral engine.
//!
//! Only failures live here. The ordinary outcomes of an optimization problem
//! (`Empty`, `Unbounded`) are values of [`crate::lp::LpResult`] and
//! [`crate::ilp::IlpResult`], not errors.

use thiserror::Error;

/// Top-level error type for the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolyError {
    /// Mismatched spaces, out-of-range indices, malformed rows.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An input shape the algorithm does not handle.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The LP oracle could not complete.
    #[error("LP oracle failure: {0}")]
    OracleFailure(String),
}

impl PolyError {
    /// Shorthand for [`PolyError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        PolyError::InvalidArgument(message.into())
    }

    /// Shorthand for [`PolyError::Unsupported`].
    pub fn unsupported(message: impl Into<String>) -> Self {
        PolyError::Unsupported(message.into())
    }

    /// Shorthand for [`PolyError::OracleFailure`].
    pub fn oracle(message: impl Into<String>) -> Self {
        PolyError::OracleFailure(message.into())
    }
}

/// Result type using PolyError.
pub type PolyResult<T> = Result<T, PolyError>;
