//! Error types for footprint-insight.
//!
//! Errors only exist at the edges of the system: record creation, the
//! record store, configuration, export and the external recommendation
//! generator. The analytics core itself is total and never returns one.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for footprint-insight operations.
#[derive(Error, Debug)]
pub enum FootprintError {
    /// A trip or bill failed validation at the record-creation boundary.
    #[error("Invalid record field '{field}': {reason}")]
    InvalidRecord {
        /// Name of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// No record matches the given id (or id prefix).
    #[error("Record not found: {id}")]
    RecordNotFound {
        /// Id or prefix that was looked up.
        id: String,
    },

    /// An id prefix matched more than one record.
    #[error("Ambiguous record id '{id}' matches {matches} records")]
    AmbiguousRecord {
        /// Prefix that was looked up.
        id: String,
        /// Number of matching records.
        matches: usize,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Record store failure.
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message.
        message: String,
        /// Underlying SQLite error, if available.
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Human-readable error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// Export error.
    #[error("Export failed: {message}")]
    ExportError {
        /// Human-readable error message.
        message: String,
    },

    /// The recommendation generator failed.
    #[error("Recommendation generator failed: {message}")]
    Generator {
        /// Human-readable error message.
        message: String,
    },

    /// The recommendation generator answered with the wrong shape.
    #[error("Recommendation generator returned {count} usable recommendations (expected 3)")]
    MalformedRecommendations {
        /// Number of usable strings that came back.
        count: usize,
    },

    /// Timeout error.
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        /// Duration in milliseconds before timeout.
        duration_ms: u64,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    IoError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid argument.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Name of the invalid argument.
        name: String,
        /// Reason why the argument is invalid.
        reason: String,
    },

    /// Unsupported operation or feature.
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Name of the unsupported feature.
        feature: String,
    },
}

impl FootprintError {
    /// Create a new record validation error.
    #[must_use]
    pub fn invalid_record(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new storage error wrapping a SQLite error.
    #[must_use]
    pub fn storage(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a new export error.
    #[must_use]
    pub fn export(message: impl Into<String>) -> Self {
        Self::ExportError {
            message: message.into(),
        }
    }

    /// Create a new generator error.
    #[must_use]
    pub fn generator(message: impl Into<String>) -> Self {
        Self::Generator {
            message: message.into(),
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidRecord { .. } | Self::InvalidArgument { .. } => 2,
            Self::RecordNotFound { .. } | Self::AmbiguousRecord { .. } | Self::FileNotFound { .. } => 3,
            Self::ConfigError { .. } | Self::InvalidConfig { .. } => 5,
            Self::ExportError { .. } => 6,
            Self::Storage { .. } => 7,
            Self::IoError { .. } => 74,
            _ => 1,
        }
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors are the ones the insight assembler absorbs by
    /// falling back to local recommendations.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Generator { .. } | Self::MalformedRecommendations { .. } | Self::Timeout { .. }
        )
    }
}

/// Result type alias for footprint-insight operations.
pub type Result<T> = std::result::Result<T, FootprintError>;

impl From<std::io::Error> for FootprintError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for FootprintError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

impl From<rusqlite::Error> for FootprintError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for FootprintError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { duration_ms: 0 }
        } else {
            Self::Generator {
                message: err.to_string(),
            }
        }
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// Operation completed successfully.
    pub const EXIT_SUCCESS: i32 = 0;
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// A record or argument failed validation.
    pub const EXIT_INVALID_INPUT: i32 = 2;
    /// Specified record or file not found.
    pub const EXIT_NOT_FOUND: i32 = 3;
    /// Invalid configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Export operation failed.
    pub const EXIT_EXPORT_ERROR: i32 = 6;
    /// Record store failure.
    pub const EXIT_STORAGE_ERROR: i32 = 7;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
}
