//! Error types for descriptor operations.
//!
//! Errors are categorized so the command layer can decide between aborting
//! with a non-zero exit and reporting a recoverable problem. Every variant
//! carries the path or name the operator needs to act on.

use std::path::PathBuf;
use thiserror::Error;

/// Categories of errors for exit-code and reporting decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A required file is missing and was not created
    PreconditionMissing,
    /// Operator-supplied input is unusable
    InvalidInput,
    /// A descriptor on disk could not be understood
    Parse,
    /// Filesystem failure
    Io,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::PreconditionMissing => "Required file missing",
            Self::InvalidInput => "Invalid input",
            Self::Parse => "Unreadable descriptor",
            Self::Io => "Filesystem error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::PreconditionMissing => "Create the file or point --infra-file at an existing one",
            Self::InvalidInput => "Check the offending value and run the command again",
            Self::Parse => "Fix the reported field by hand, then retry",
            Self::Io => "Check that the path exists and is writable",
        }
    }
}

/// Errors that can occur while loading, editing or writing descriptors.
#[derive(Debug, Error)]
pub enum Error {
    /// The descriptor text is not valid YAML or has the wrong top-level shape
    #[error("cannot parse {}: {message}", .path.display())]
    Parse {
        /// File the text came from (empty for in-memory input)
        path: PathBuf,
        /// Description of the problem
        message: String,
    },

    /// A recognized service field has a shape this tool cannot represent
    #[error("service '{service}': field '{field}' {message}")]
    InvalidField {
        /// Service the field belongs to
        service: String,
        /// Field name
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// Operator input that cannot be turned into a descriptor
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Preset name not present in the preset table
    #[error("unknown resource preset '{0}'")]
    UnknownPreset(String),

    /// The custom preset was requested without both cpus and memory
    #[error("the Custom preset requires both --cpus and --memory")]
    IncompletePreset,

    /// A required shared-infrastructure file does not exist
    #[error("infrastructure file not found: {}", .0.display())]
    PreconditionMissing(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::PreconditionMissing(_) => ErrorCategory::PreconditionMissing,
            Error::InvalidInput(_) | Error::UnknownPreset(_) | Error::IncompletePreset => {
                ErrorCategory::InvalidInput
            }
            Error::Parse { .. } | Error::InvalidField { .. } => ErrorCategory::Parse,
            Error::Io(_) => ErrorCategory::Io,
        }
    }

    pub(crate) fn field(
        service: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::InvalidField {
            service: service.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for descriptor operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_errors_are_invalid_input() {
        assert_eq!(
            Error::UnknownPreset("Huge".into()).category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(Error::IncompletePreset.category(), ErrorCategory::InvalidInput);
    }

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = Error::field("web", "ports", "must be a sequence");
        assert_eq!(err.to_string(), "service 'web': field 'ports' must be a sequence");

        let err = Error::PreconditionMissing(PathBuf::from("/srv/infra.yml"));
        assert!(err.to_string().contains("/srv/infra.yml"));
        assert_eq!(err.category(), ErrorCategory::PreconditionMissing);
    }
}
