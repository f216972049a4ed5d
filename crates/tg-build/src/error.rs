/// Build engine error types
use crate::target_ref::TargetRef;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("{name}: Invalid name.")]
    InvalidName { name: String },

    #[error("{target}: {dependency}: Invalid dependency.")]
    InvalidDependency { target: String, dependency: String },

    #[error("{target}: {value}: Invalid {field}.")]
    InvalidField {
        target: String,
        field: &'static str,
        value: String,
    },

    #[error("{path}: No local root found from here.")]
    LocalRootNotFound { path: String },

    #[error("{target}: Multiple targets with the same name.")]
    DuplicateTarget { target: TargetRef },

    #[error("{target}: Target not found.")]
    MissingTarget { target: TargetRef },

    #[error("{dependency} -> ... -> {dependent} -> {dependency}: Circular dependency.")]
    CircularDependency {
        dependency: TargetRef,
        dependent: TargetRef,
    },

    #[error("{file}:{line}:{column}: {message}")]
    DeclarationSyntax {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{file}:{line}: '{name}' is not a known target constructor")]
    UnknownConstructor {
        file: PathBuf,
        line: usize,
        name: String,
    },

    #[error("{file}:{line}: {constructor}: {message}")]
    InvalidArguments {
        file: PathBuf,
        line: usize,
        constructor: String,
        message: String,
    },

    #[error("{pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{target}: {source_file}: Unexpected file extension.")]
    UnsupportedSource { target: TargetRef, source_file: String },

    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// Create an invalid address error
    pub fn invalid_address(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid field error for a declared target
    pub fn invalid_field(target: impl ToString, field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidField {
            target: target.to_string(),
            field,
            value: value.into(),
        }
    }

    /// Create an I/O error with path context, folding `NotFound` into its own variant
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        let path = path.into();
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::IoError { path, error }
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error is a missing file rather than a malformed one
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message() {
        let err = BuildError::CircularDependency {
            dependency: TargetRef::new("//a", "a"),
            dependent: TargetRef::new("//c", "c"),
        };
        assert_eq!(
            err.to_string(),
            "//a:a -> ... -> //c:c -> //a:a: Circular dependency."
        );
    }

    #[test]
    fn test_io_not_found_is_folded() {
        let err = BuildError::io(
            "/nowhere/TARGETS",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());

        let err = BuildError::io(
            "/nowhere/TARGETS",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
    }
}
