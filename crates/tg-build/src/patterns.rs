//! Command-line target patterns
//!
//! - `path:name` names one target
//! - `.` selects every target under the current directory
//! - a bare path selects every target declared anywhere below it
//!
//! Paths that are not absolute are resolved against the current directory,
//! which must then lie inside the source tree.

use crate::cache::TargetCache;
use crate::declaration::TARGETS_FILE;
use crate::error::{BuildError, BuildResult};
use crate::target_ref::TargetRef;
use tracing::warn;
use walkdir::WalkDir;

/// Expand one pattern into target references
pub fn resolve_pattern(
    cache: &mut TargetCache,
    pattern: &str,
    current_path: Option<&str>,
) -> BuildResult<Vec<TargetRef>> {
    let (path, name) = match pattern.rsplit_once(':') {
        Some((path, name)) => (path, Some(name)),
        None if pattern == "." => ("", None),
        None => (pattern, None),
    };

    let src_fs = cache.src_fs();
    if !src_fs.is_path(path) {
        return Err(BuildError::invalid_pattern(pattern, "Invalid target."));
    }
    if let Some(name) = name {
        if !src_fs.is_name(name) {
            return Err(BuildError::invalid_pattern(pattern, "Invalid target."));
        }
    }

    let path = if src_fs.is_absolute_path(path) {
        path.to_string()
    } else {
        let current_path = current_path
            .ok_or_else(|| BuildError::invalid_pattern(pattern, "Unable to find target."))?;
        src_fs.combine_paths(current_path, &[path])?
    };

    if let Some(name) = name {
        return Ok(vec![TargetRef::new(path, name)]);
    }

    let mut directories = Vec::new();
    for entry in WalkDir::new(src_fs.make_real_path(&path)?)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(pattern, "skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.file_type().is_file() && entry.file_name() == TARGETS_FILE {
            if let Some(parent) = entry.path().parent() {
                directories.push(src_fs.make_path(parent)?);
            }
        }
    }

    let mut result = Vec::new();
    for directory in directories {
        result.extend(cache.get_targets(&directory)?.keys().cloned());
    }
    if result.is_empty() {
        warn!(pattern, "pattern matched no targets");
    }
    Ok(result)
}

/// Expand every pattern, returning a sorted, duplicate-free list
pub fn resolve_patterns<S: AsRef<str>>(
    cache: &mut TargetCache,
    patterns: &[S],
    current_path: Option<&str>,
) -> BuildResult<Vec<TargetRef>> {
    let mut result = Vec::new();
    for pattern in patterns {
        result.extend(resolve_pattern(cache, pattern.as_ref(), current_path)?);
    }
    result.sort();
    result.dedup();
    Ok(result)
}
