//! Error handling module

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for operations that can fail with `ProbeError`
pub(crate) type Result<T> = std::result::Result<T, ProbeError>;

/// Error type for everything that can go wrong before or around a probe run.
///
/// Probe observations (denials, provider errors) are not errors; they are
/// recorded in the ledger. This enum covers validation, suite loading and
/// placeholder failures that stop a run from starting.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// File system operation errors with detailed context
    #[error("File system error during {operation} on path '{path}': {source}")]
    FileSystem {
        /// The operation that failed (e.g., "read")
        operation: String,
        /// The file path involved in the operation
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing and serialization errors with context
    #[error("JSON parsing error in {context}: {source}")]
    JsonParsing {
        /// Context where the JSON error occurred (e.g., "suite 'bucket-policy'")
        context: String,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Input validation errors for user-provided data
    #[error("Validation error: {message}")]
    Validation {
        /// Detailed validation error message
        message: String,
        /// Optional field name that failed validation
        field: Option<String>,
    },

    /// A suite name that is not embedded in the binary
    #[error("Unknown probe suite '{name}'. Available suites: {available}")]
    SuiteNotFound {
        /// Requested suite name
        name: String,
        /// Comma-separated list of embedded suites
        available: String,
    },

    /// Placeholder resolution errors for templated case fields
    #[error("Cannot resolve placeholder '${{{placeholder}}}' in case '{case}': {message}")]
    Placeholder {
        /// Case whose field referenced the placeholder
        case: String,
        /// Placeholder name without `${}`
        placeholder: String,
        /// Detailed error message
        message: String,
    },
}

impl ProbeError {
    /// Create a file system error with operation context
    pub(crate) fn file_system(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a JSON parsing error with context
    pub(crate) fn json_parsing(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParsing {
            context: context.into(),
            source,
        }
    }

    /// Create a validation error naming the offending field
    pub(crate) fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a suite-not-found error
    pub(crate) fn suite_not_found(name: impl Into<String>, available: &[&str]) -> Self {
        Self::SuiteNotFound {
            name: name.into(),
            available: available.join(", "),
        }
    }

    /// Create a placeholder resolution error
    pub(crate) fn placeholder(
        case: impl Into<String>,
        placeholder: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Placeholder {
            case: case.into(),
            placeholder: placeholder.into(),
            message: message.into(),
        }
    }
}
