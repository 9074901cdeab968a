//! Error types for the Mirador engine.
//!
//! Errors here cover data construction and validation only. Model evaluation
//! itself does not return errors: every model produces an
//! [`Evaluation`](crate::Evaluation) that encodes degraded outcomes in the
//! success type.

use thiserror::Error;

/// The main error type for Mirador operations.
#[derive(Debug, Error)]
pub enum MiradorError {
    /// A price series or flow series failed validation on construction.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required column is missing from an input frame.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Input series are too short or empty for the requested construction.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for MiradorError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for MiradorError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for Mirador operations.
pub type Result<T> = std::result::Result<T, MiradorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MiradorError::InvalidData("high below close".to_string());
        assert_eq!(err.to_string(), "Invalid data: high below close");

        let err = MiradorError::MissingColumn("close".to_string());
        assert_eq!(err.to_string(), "Missing required column: close");
    }

    #[test]
    fn test_error_from_str() {
        let err: MiradorError = "something went wrong".into();
        assert!(matches!(err, MiradorError::Other(_)));
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: Result<i32> = Err(MiradorError::Other("fail".to_string()));
        assert!(err_result.is_err());
    }
}
