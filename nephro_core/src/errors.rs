//! # Error Types
//!
//! Structured error types for nephro_core. Every variant carries enough
//! context for a caller to decide what to show the user or which input to
//! highlight.
//!
//! Out-of-domain arithmetic (log of a non-positive number, a zero
//! denominator) is **not** an error: formulas report it as
//! [`Output::Undefined`](crate::outputs::Output::Undefined) so one bad
//! calculation never turns into a failure of the calling layer.
//!
//! ## Example
//!
//! ```rust
//! use nephro_core::errors::{CalcError, CalcResult};
//!
//! fn validate_age(age: f64) -> CalcResult<()> {
//!     if age <= 0.0 {
//!         return Err(CalcError::invalid_input("age", age.to_string(), "Age must be positive"));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for nephro_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculator operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value has the wrong kind or is not one of the allowed options
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A field the caller asked for is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Required inputs have not been entered yet; the calculator is not ready
    #[error("Calculator '{calculator_id}' is missing required inputs: {}", .missing.join(", "))]
    NotReady {
        calculator_id: String,
        missing: Vec<String>,
    },

    /// No calculator is registered under this id
    #[error("Unknown calculator: {calculator_id}")]
    UnknownCalculator { calculator_id: String },

    /// The calculator has no input with this id
    #[error("Unknown input '{input_id}' for calculator '{calculator_id}'")]
    UnknownInput {
        calculator_id: String,
        input_id: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a NotReady error
    pub fn not_ready(calculator_id: impl Into<String>, missing: Vec<String>) -> Self {
        CalcError::NotReady {
            calculator_id: calculator_id.into(),
            missing,
        }
    }

    /// Create an UnknownCalculator error
    pub fn unknown_calculator(calculator_id: impl Into<String>) -> Self {
        CalcError::UnknownCalculator {
            calculator_id: calculator_id.into(),
        }
    }

    /// Create an UnknownInput error
    pub fn unknown_input(calculator_id: impl Into<String>, input_id: impl Into<String>) -> Self {
        CalcError::UnknownInput {
            calculator_id: calculator_id.into(),
            input_id: input_id.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Unknown ids come from code, not from the person entering values.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            CalcError::UnknownCalculator { .. } | CalcError::UnknownInput { .. } | CalcError::Internal { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::NotReady { .. } => "NOT_READY",
            CalcError::UnknownCalculator { .. } => "UNKNOWN_CALCULATOR",
            CalcError::UnknownInput { .. } => "UNKNOWN_INPUT",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError { reason: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("creatinine", "-1.0", "Creatinine must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("test").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::unknown_calculator("nope").error_code(), "UNKNOWN_CALCULATOR");
        assert_eq!(
            CalcError::not_ready("fena", vec!["urine_sodium".into()]).error_code(),
            "NOT_READY"
        );
    }

    #[test]
    fn test_not_ready_message_lists_inputs() {
        let error = CalcError::not_ready("fena", vec!["urine_sodium".into(), "plasma_sodium".into()]);
        assert_eq!(
            error.to_string(),
            "Calculator 'fena' is missing required inputs: urine_sodium, plasma_sodium"
        );
    }

    #[test]
    fn test_programming_errors() {
        assert!(CalcError::unknown_calculator("x").is_programming_error());
        assert!(CalcError::unknown_input("fena", "x").is_programming_error());
        assert!(!CalcError::not_ready("fena", vec![]).is_programming_error());
    }
}
