//! Error types and result aliases for Garnet operations.
//!
//! Provides a unified error type for configuration and input handling with
//! actionable error messages. Resolution failures live in `garnet-resolver`.

use crate::types::{PlatformError, RequirementError, VersionError};
use thiserror::Error;

/// Unified error type for Garnet operations
#[derive(Error, Debug)]
pub enum GarnetError {
    // Config errors
    #[error("Failed to parse config: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Input errors
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    #[error(transparent)]
    InvalidPlatform(#[from] PlatformError),

    #[error(transparent)]
    InvalidRequirement(#[from] RequirementError),

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Garnet operations
pub type GarnetResult<T> = Result<T, GarnetError>;

impl GarnetError {
    /// Create a validation error for a config field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GarnetError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            GarnetError::TomlParse { .. } => Some("Check the config file for TOML syntax errors"),
            GarnetError::InvalidRequirement(err) if err.is_unknown_operator() => {
                Some("Use one of =, !=, >, >=, <, <= or ~>")
            },
            GarnetError::InvalidPlatform(_) => {
                Some("Platforms are written as `ruby` or `cpu-os[-version]`")
            },
            _ => None,
        }
    }
}
