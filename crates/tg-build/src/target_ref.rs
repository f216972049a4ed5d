//! Target references: `(directory, name)` pairs written as `//dir:name`
use crate::error::{BuildError, BuildResult};
use crate::path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique identity of a declared target
///
/// Ordering is lexicographic on the directory address, then the name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    /// Absolute address of the declaring directory
    pub path: String,
    /// Short name within that directory
    pub name: String,
}

impl TargetRef {
    /// Create a reference without validation
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Parse the canonical `//dir:name` form
    pub fn parse(s: &str) -> BuildResult<Self> {
        let (path, name) = s
            .rsplit_once(':')
            .ok_or_else(|| BuildError::invalid_address(s, "Expected <path>:<name>."))?;
        if !path::is_absolute_path(path) {
            return Err(BuildError::invalid_address(path, "Absolute path expected."));
        }
        if !path::is_name(name) {
            return Err(BuildError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(Self::new(path, name))
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.name)
    }
}
