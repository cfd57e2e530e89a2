//! Error types for `onerep`
//!
//! Each concern owns a `thiserror` enum; [`OneRepError`] aggregates them
//! and maps every variant onto a process exit code.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::Profile;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `onerep` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Session error (no exercise selected, unknown exercise)
    pub const SESSION_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `onerep` operations.
#[derive(Debug, Error)]
pub enum OneRepError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Persistence error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Exercise registry error
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Workout session error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl OneRepError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Store(_) | Self::Io(_) | Self::Json(_) => ExitCode::IO_ERROR,
            Self::Registry(_) | Self::Session(_) => ExitCode::SESSION_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set (referenced at line {line})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// One-based line of the reference
        line: usize,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Dotted path to the problematic field (e.g., "phases.rest")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - validation failure that prevents configuration from being used
    Error,
    /// Warning - potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Store Errors
// ============================================================================

/// Persistence errors.
///
/// Decode failures of existing files never surface here: stores fall back
/// to empty state. These variants cover failures to write.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing a store file failed
    #[error("failed to write {path}: {source}")]
    Write {
        /// File being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Encoding a value failed
    #[error("failed to encode '{key}': {source}")]
    Encode {
        /// Store key or file name
        key: String,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Shared template payload could not be decoded
    #[error("invalid template data: {0}")]
    InvalidTemplate(String),
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Exercise registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No exercise with that name (optionally with a close match)
    #[error("unknown exercise '{name}'{}", suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
    UnknownExercise {
        /// Name as typed
        name: String,
        /// Closest known name, if any
        suggestion: Option<String>,
    },

    /// Exercise id is not part of the current workout
    #[error("exercise {0} is not part of the current workout")]
    UnknownId(uuid::Uuid),

    /// An exercise with that name already exists
    #[error("exercise '{0}' already exists")]
    DuplicateExercise(String),

    /// Exercise names cannot be blank
    #[error("exercise name cannot be empty")]
    EmptyName,

    /// Move index out of range
    #[error("index {index} out of range (workout has {len} exercises)")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Number of exercises
        len: usize,
    },

    /// Unsupported profile number
    #[error("profile {0} is not supported (expected 1 or 2)")]
    InvalidProfile(u8),

    /// Template lookup failed
    #[error("no template named '{name}' for profile {profile}")]
    UnknownTemplate {
        /// Template name
        name: String,
        /// Profile searched
        profile: Profile,
    },

    /// Persisting registry state failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Session Errors
// ============================================================================

/// Workout session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Operation requires an active exercise
    #[error("no exercise is active")]
    NoActiveExercise,

    /// Weight must be finite and non-negative
    #[error("invalid weight {0}")]
    InvalidWeight(f64),

    /// RPE must be within 1..=10
    #[error("RPE {0} is out of range (expected 1-10)")]
    InvalidRpe(u8),

    /// Registry failure during a session operation
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Persistence failure during a session operation
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `onerep` operations.
pub type Result<T> = std::result::Result<T, OneRepError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::SESSION_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_session_error_exit_code() {
        let err: OneRepError = SessionError::NoActiveExercise.into();
        assert_eq!(err.exit_code(), ExitCode::SESSION_ERROR);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: OneRepError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: OneRepError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_usage_error_exit_code() {
        let err = OneRepError::Usage("missing weight".to_string());
        assert_eq!(err.exit_code(), ExitCode::USAGE_ERROR);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "phases.rest".to_string(),
            message: "duration too long".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(issue.to_string(), "error: duration too long at phases.rest");
    }

    #[test]
    fn test_unknown_exercise_with_suggestion() {
        let err = RegistryError::UnknownExercise {
            name: "Leg Pres".to_string(),
            suggestion: Some("Leg Press".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unknown exercise 'Leg Pres' (did you mean 'Leg Press'?)"
        );
    }

    #[test]
    fn test_unknown_exercise_without_suggestion() {
        let err = RegistryError::UnknownExercise {
            name: "Snatch".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown exercise 'Snatch'");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("onerep.yaml"),
            line: Some(4),
            message: "unexpected token".to_string(),
        };
        assert!(err.to_string().contains("onerep.yaml"));
        assert!(err.to_string().contains("unexpected token"));
    }
}
