//! # Error Types
//!
//! Structured error types for cost_core. Every stage of the foundation
//! pipeline returns a [`CalcResult`], so a caller can tell a bad input
//! table apart from a degenerate load case or an empty schedule without
//! parsing strings.
//!
//! ## Example
//!
//! ```rust
//! use cost_core::errors::{CalcError, CalcResult};
//!
//! fn validate_turbines(num_turbines: u32) -> CalcResult<()> {
//!     if num_turbines == 0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "num_turbines".to_string(),
//!             value: num_turbines.to_string(),
//!             reason: "At least one turbine is required".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for cost_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for cost calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (negative geometry, unparsable price, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A material id has no partner row in a joined table
    #[error("Join mismatch in {table} for material '{material_id}': {reason}")]
    JoinMismatch {
        table: String,
        material_id: String,
        reason: String,
    },

    /// A formula would divide by zero (zero lateral or dead load)
    #[error("Division by zero in {operation}: {reason}")]
    DivisionByZero { operation: String, reason: String },

    /// The operation schedule cannot support a weather multiplier
    #[error("Invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON/CSV serialization or deserialization error
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

    /// Create a JoinMismatch error
    pub fn join_mismatch(table: impl Into<String>, material_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::JoinMismatch {
            table: table.into(),
            material_id: material_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a DivisionByZero error
    pub fn division_by_zero(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::DivisionByZero {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidSchedule error
    pub fn invalid_schedule(reason: impl Into<String>) -> Self {
        CalcError::InvalidSchedule {
            reason: reason.into(),
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

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::JoinMismatch { .. } => "JOIN_MISMATCH",
            CalcError::DivisionByZero { .. } => "DIVISION_BY_ZERO",
            CalcError::InvalidSchedule { .. } => "INVALID_SCHEDULE",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
