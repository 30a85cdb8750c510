//! Unified error types for the croft ecosystem
//!
//! This module provides a common error type [`CroftError`] that can represent
//! errors from any part of the system. Domain-specific failures can be
//! converted to `CroftError` for uniform handling at API boundaries.
//!
//! Per-candidate and per-move failures are deliberately *not* errors: an
//! infeasible (field, crop) pair is skipped and counted, and a rejected move
//! instruction travels as a value in the adjust result. Only instance-level
//! validation failures and solver invariant violations surface as `Err`.
//!
//! # Example
//!
//! ```ignore
//! use croft_core::{CroftError, CroftResult};
//!
//! fn plan(path: &str) -> CroftResult<()> {
//!     let instance = load_instance(path)?;
//!     optimize(&instance)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all croft operations.
#[derive(Error, Debug)]
pub enum CroftError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration or input value out of domain, malformed profile,
    /// inconsistent planning window
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Weather series does not cover the requested dates
    #[error("Missing weather: {0}")]
    MissingWeather(String),

    /// No candidate satisfies the constraints for a (field, crop) pair
    #[error("Infeasible: {0}")]
    Infeasible(String),

    /// A candidate violated a constraint during re-optimization
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A solver produced a plan that violates a plan invariant. Fatal;
    /// indicates a bug in the solver, not in the input.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using CroftError.
pub type CroftResult<T> = Result<T, CroftError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for CroftError {
    fn from(err: anyhow::Error) -> Self {
        CroftError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for CroftError {
    fn from(s: String) -> Self {
        CroftError::Other(s)
    }
}

impl From<&str> for CroftError {
    fn from(s: &str) -> Self {
        CroftError::Other(s.to_string())
    }
}

// JSON parsing errors
impl From<serde_json::Error> for CroftError {
    fn from(err: serde_json::Error) -> Self {
        CroftError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CroftError::Infeasible("no viable start date".into());
        assert!(err.to_string().contains("Infeasible"));
        assert!(err.to_string().contains("no viable start date"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CroftError = io_err.into();
        assert!(matches!(err, CroftError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: CroftError = json_err.into();
        assert!(matches!(err, CroftError::Parse(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> CroftResult<()> {
            Err(CroftError::InvalidInput("bad window".into()))
        }

        fn outer() -> CroftResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
